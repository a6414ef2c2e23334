use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sbk_types::ProjectId;

/// Per-project-id lock registry.
///
/// Every mutating operation on a project takes that id's lock around its
/// read-whole/write-whole cycle; operations on different ids run fully in
/// parallel. Locks are created on first use and kept for the process
/// lifetime — the id space is small and ids are never recycled within a
/// process, so there is nothing to evict.
#[derive(Default)]
pub(crate) struct LockRegistry {
    locks: Mutex<HashMap<ProjectId, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    /// The lock for `id`, created if this is the first use.
    pub(crate) fn for_id(&self, id: ProjectId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock poisoned");
        Arc::clone(locks.entry(id).or_default())
    }
}
