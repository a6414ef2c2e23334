use std::collections::HashMap;
use std::sync::RwLock;

use sbk_types::ProjectId;

use crate::error::StoreResult;
use crate::traits::ContainerStore;

/// In-memory, HashMap-based container store.
///
/// Intended for tests and embedding. Containers are held behind a `RwLock`
/// and cloned on read.
#[derive(Default)]
pub struct InMemoryContainerStore {
    containers: RwLock<HashMap<ProjectId, Vec<u8>>>,
}

impl InMemoryContainerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of containers currently stored.
    pub fn len(&self) -> usize {
        self.containers.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.read().expect("lock poisoned").is_empty()
    }
}

impl ContainerStore for InMemoryContainerStore {
    fn load(&self, id: ProjectId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.containers.read().expect("lock poisoned");
        Ok(map.get(&id).cloned())
    }

    fn save(&self, id: ProjectId, bytes: &[u8]) -> StoreResult<()> {
        let mut map = self.containers.write().expect("lock poisoned");
        map.insert(id, bytes.to_vec());
        Ok(())
    }

    fn remove(&self, id: ProjectId) -> StoreResult<bool> {
        let mut map = self.containers.write().expect("lock poisoned");
        Ok(map.remove(&id).is_some())
    }

    fn ids(&self) -> StoreResult<Vec<ProjectId>> {
        let map = self.containers.read().expect("lock poisoned");
        let mut ids: Vec<ProjectId> = map.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryContainerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContainerStore")
            .field("container_count", &self.len())
            .finish()
    }
}
