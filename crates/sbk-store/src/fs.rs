use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sbk_types::ProjectId;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::ContainerStore;

/// Filesystem container store: one `{id}.sb3` file per project in a flat
/// directory.
///
/// Saves go through a temp file in the same directory followed by a rename,
/// so a concurrent `load` never observes a torn write.
#[derive(Debug)]
pub struct FsContainerStore {
    root: PathBuf,
}

impl FsContainerStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The directory containing the container files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: ProjectId) -> PathBuf {
        self.root.join(format!("{id}.sb3"))
    }
}

impl ContainerStore for FsContainerStore {
    fn load(&self, id: ProjectId) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, id: ProjectId, bytes: &[u8]) -> StoreResult<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.path_for(id)).map_err(|e| e.error)?;
        debug!(%id, size = bytes.len(), "saved container");
        Ok(())
    }

    fn remove(&self, id: ProjectId) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn ids(&self) -> StoreResult<Vec<ProjectId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sb3") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Non-numeric names (temp files, strays) are not containers.
            if let Ok(id) = stem.parse::<ProjectId>() {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
