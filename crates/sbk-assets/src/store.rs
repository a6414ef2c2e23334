use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sbk_types::AssetId;
use tracing::debug;

use crate::error::AssetResult;

/// Blob storage backend for served assets.
///
/// Assets are immutable once written — the identifier is derived from
/// content, so overwriting an existing identifier with different bytes is a
/// caller bug, not something the store defends against. Implementations
/// must be thread-safe.
pub trait AssetStore: Send + Sync {
    /// Read a blob. `Ok(None)` if nothing is stored under the identifier.
    fn fetch(&self, id: &AssetId) -> AssetResult<Option<Vec<u8>>>;

    /// Write a blob under the identifier (idempotent for equal content).
    fn put(&self, id: &AssetId, bytes: &[u8]) -> AssetResult<()>;

    /// Whether a blob exists under the identifier.
    fn contains(&self, id: &AssetId) -> AssetResult<bool> {
        Ok(self.fetch(id)?.is_some())
    }
}

/// In-memory asset store for tests and embedding.
#[derive(Default)]
pub struct InMemoryAssetStore {
    blobs: RwLock<HashMap<AssetId, Vec<u8>>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

impl AssetStore for InMemoryAssetStore {
    fn fetch(&self, id: &AssetId) -> AssetResult<Option<Vec<u8>>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn put(&self, id: &AssetId, bytes: &[u8]) -> AssetResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(id.clone(), bytes.to_vec());
        Ok(())
    }
}

/// Filesystem asset store: one file per asset in a flat directory, named by
/// content identifier.
///
/// [`AssetId`] parsing already rejects separators and traversal sequences,
/// so the join below cannot escape the root.
#[derive(Debug)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> AssetResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &AssetId) -> PathBuf {
        self.root.join(id.file_name())
    }
}

impl AssetStore for FsAssetStore {
    fn fetch(&self, id: &AssetId) -> AssetResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, id: &AssetId, bytes: &[u8]) -> AssetResult<()> {
        fs::write(self.path_for(id), bytes)?;
        debug!(asset = %id, size = bytes.len(), "stored asset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(s: &str) -> AssetId {
        s.parse().unwrap()
    }

    #[test]
    fn memory_put_fetch_roundtrip() {
        let store = InMemoryAssetStore::new();
        let id = asset("83a9787d4cb6f3b7632b4ddfebf74367.wav");
        store.put(&id, b"RIFF....").unwrap();
        assert_eq!(store.fetch(&id).unwrap().unwrap(), b"RIFF....");
    }

    #[test]
    fn memory_fetch_missing_is_none() {
        let store = InMemoryAssetStore::new();
        assert!(store.fetch(&asset("deadbeef.png")).unwrap().is_none());
    }

    #[test]
    fn fetch_is_idempotent() {
        let store = InMemoryAssetStore::new();
        let id = asset("cd21514d0531fdffb22204e0ec5ed84a.svg");
        store.put(&id, b"<svg/>").unwrap();
        let first = store.fetch(&id).unwrap().unwrap();
        let second = store.fetch(&id).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fs_put_fetch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::open(dir.path()).unwrap();
        let id = asset("83a9787d4cb6f3b7632b4ddfebf74367.wav");
        store.put(&id, b"sound bytes").unwrap();
        assert_eq!(store.fetch(&id).unwrap().unwrap(), b"sound bytes");
        assert!(dir
            .path()
            .join("83a9787d4cb6f3b7632b4ddfebf74367.wav")
            .exists());
    }

    #[test]
    fn fs_fetch_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::open(dir.path()).unwrap();
        assert!(store.fetch(&asset("deadbeef.png")).unwrap().is_none());
    }
}
