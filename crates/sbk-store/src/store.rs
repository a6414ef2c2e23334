use std::sync::{Arc, Mutex};

use sbk_archive::{ArchiveError, Container, COMMENTS_ENTRY, METADATA_ENTRY, PROGRAM_ENTRY};
use sbk_types::{CommentForest, Program, ProjectId, ProjectMetadata};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::document::{Document, DocumentKind};
use crate::error::{StoreError, StoreResult};
use crate::locks::LockRegistry;
use crate::traits::ContainerStore;

/// Proof that a project exists; returned by [`DocumentStore::open`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProjectHandle {
    id: ProjectId,
}

impl ProjectHandle {
    pub fn id(&self) -> ProjectId {
        self.id
    }
}

/// The project abstraction over a raw [`ContainerStore`].
///
/// Reads parse one logical document out of the container; writes follow the
/// read-whole/mutate-one-entry/write-whole protocol under that project's
/// exclusive lock, so two concurrent writers to the same id can never
/// clobber each other's entries. Writers to different ids do not contend.
///
/// Id allocation (`max existing + 1`) runs under a dedicated allocation
/// lock held across the scan *and* the initial save, so concurrent creates
/// and forks cannot mint the same id.
pub struct DocumentStore {
    backend: Arc<dyn ContainerStore>,
    locks: LockRegistry,
    alloc_lock: Mutex<()>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn ContainerStore>) -> Self {
        Self {
            backend,
            locks: LockRegistry::default(),
            alloc_lock: Mutex::new(()),
        }
    }

    /// All project ids currently stored, ascending.
    pub fn project_ids(&self) -> StoreResult<Vec<ProjectId>> {
        self.backend.ids()
    }

    /// Check that a project exists.
    pub fn open(&self, id: ProjectId) -> StoreResult<ProjectHandle> {
        if self.backend.contains(id)? {
            Ok(ProjectHandle { id })
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    /// Load and decode the full container (read-only snapshot).
    pub fn load_container(&self, id: ProjectId) -> StoreResult<Container> {
        let bytes = self.backend.load(id)?.ok_or(StoreError::NotFound(id))?;
        decode(id, &bytes)
    }

    /// Read one logical document.
    ///
    /// A missing `comments.json` parses as the empty forest; a missing
    /// mandatory entry is `MissingDocument` (corruption-class, logged).
    pub fn read_document(&self, id: ProjectId, kind: DocumentKind) -> StoreResult<Document> {
        let container = self.load_container(id)?;
        read_from(id, &container, kind)
    }

    /// Convenience: the parsed metadata document.
    pub fn read_metadata(&self, id: ProjectId) -> StoreResult<ProjectMetadata> {
        let container = self.load_container(id)?;
        parse_mandatory(id, &container, DocumentKind::Metadata)
    }

    /// Replace exactly one logical document, leaving every other entry
    /// byte-identical.
    pub fn replace_document(&self, id: ProjectId, document: &Document) -> StoreResult<()> {
        let bytes = document.to_bytes()?;
        self.update_container(id, |container| {
            container.put_entry(document.entry_name(), bytes);
            Ok(())
        })
    }

    /// Serialized read-modify-write of a project's container.
    ///
    /// Takes the per-id lock, decodes, applies `mutate`, re-encodes, and
    /// saves. All higher-level mutators funnel through here. The lock is
    /// released before this returns — never call collaborators while
    /// holding it.
    pub fn update_container<R>(
        &self,
        id: ProjectId,
        mutate: impl FnOnce(&mut Container) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let lock = self.locks.for_id(id);
        let _guard = lock.lock().expect("lock poisoned");

        let bytes = self.backend.load(id)?.ok_or(StoreError::NotFound(id))?;
        let mut container = decode(id, &bytes)?;
        let result = mutate(&mut container)?;
        let new_bytes = container
            .serialize()
            .map_err(|e| archive_fault(id, e))?;
        self.backend.save(id, &new_bytes)?;
        debug!(%id, "container updated");
        Ok(result)
    }

    /// Read-modify-write of the metadata document alone.
    pub fn mutate_metadata<R>(
        &self,
        id: ProjectId,
        mutate: impl FnOnce(&mut ProjectMetadata) -> R,
    ) -> StoreResult<R> {
        self.update_container(id, |container| {
            let mut meta: ProjectMetadata =
                parse_mandatory(id, container, DocumentKind::Metadata)?;
            let result = mutate(&mut meta);
            let bytes = Document::Metadata(meta).to_bytes()?;
            container.put_entry(METADATA_ENTRY, bytes);
            Ok(result)
        })
    }

    /// Read-modify-write of the comment forest alone. A container without a
    /// comments entry starts from the empty forest and gains one.
    pub fn mutate_comments<R>(
        &self,
        id: ProjectId,
        mutate: impl FnOnce(&mut CommentForest) -> R,
    ) -> StoreResult<R> {
        self.update_container(id, |container| {
            let mut forest: CommentForest = match container.read_entry(COMMENTS_ENTRY) {
                Some(bytes) => parse_entry(id, COMMENTS_ENTRY, bytes)?,
                None => CommentForest::new(),
            };
            let result = mutate(&mut forest);
            let bytes = Document::Comments(forest).to_bytes()?;
            container.put_entry(COMMENTS_ENTRY, bytes);
            Ok(result)
        })
    }

    /// Create a project at the next free id.
    ///
    /// `build` receives the allocated id and returns the initial metadata
    /// and program; the fresh container gets all three entries (comments
    /// start empty). The allocation lock is held from the id scan through
    /// the save.
    pub fn create_with(
        &self,
        build: impl FnOnce(ProjectId) -> (ProjectMetadata, Program),
    ) -> StoreResult<(ProjectHandle, ProjectMetadata)> {
        let _alloc = self.alloc_lock.lock().expect("lock poisoned");
        let id = self.next_id()?;
        let (metadata, program) = build(id);

        let mut container = Container::new();
        container.put_entry(PROGRAM_ENTRY, Document::Program(program).to_bytes()?);
        container.put_entry(METADATA_ENTRY, Document::Metadata(metadata.clone()).to_bytes()?);
        container.put_entry(COMMENTS_ENTRY, Document::Comments(CommentForest::new()).to_bytes()?);

        let bytes = container.serialize().map_err(|e| archive_fault(id, e))?;
        self.backend.save(id, &bytes)?;
        debug!(%id, "created project");
        Ok((ProjectHandle { id }, metadata))
    }

    /// Allocate the next free id and store the container `build` assembles
    /// for it. Used by the fork engine, which lays out its own entries.
    pub fn allocate_and_put(
        &self,
        build: impl FnOnce(ProjectId) -> StoreResult<Container>,
    ) -> StoreResult<ProjectId> {
        let _alloc = self.alloc_lock.lock().expect("lock poisoned");
        let id = self.next_id()?;
        let container = build(id)?;
        let bytes = container.serialize().map_err(|e| archive_fault(id, e))?;
        self.backend.save(id, &bytes)?;
        debug!(%id, "stored assembled container");
        Ok(id)
    }

    /// Delete a project. `NotFound` if no container exists.
    pub fn delete(&self, id: ProjectId) -> StoreResult<()> {
        let lock = self.locks.for_id(id);
        let _guard = lock.lock().expect("lock poisoned");
        if self.backend.remove(id)? {
            debug!(%id, "deleted project");
            Ok(())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    /// Next id in allocation order. Caller must hold the allocation lock.
    fn next_id(&self) -> StoreResult<ProjectId> {
        let max = self.backend.ids()?.into_iter().max();
        Ok(max.map_or(ProjectId::new(1), |id| id.next()))
    }
}

/// Decode container bytes, logging corruption with the project id.
fn decode(id: ProjectId, bytes: &[u8]) -> StoreResult<Container> {
    Container::open(bytes).map_err(|e| archive_fault(id, e))
}

fn archive_fault(id: ProjectId, source: ArchiveError) -> StoreError {
    match source {
        ArchiveError::Io(e) => StoreError::Io(e),
        other => {
            error!(%id, %other, "container fault");
            StoreError::Corrupt {
                id,
                reason: other.to_string(),
            }
        }
    }
}

/// Parse one document out of an already-decoded container.
fn read_from(
    id: ProjectId,
    container: &Container,
    kind: DocumentKind,
) -> StoreResult<Document> {
    match kind {
        DocumentKind::Metadata => Ok(Document::Metadata(parse_mandatory(id, container, kind)?)),
        DocumentKind::Program => {
            let bytes = mandatory_bytes(id, container, kind)?;
            let program = Program::from_slice(bytes).map_err(|source| StoreError::Parse {
                id,
                entry: kind.entry_name(),
                source,
            })?;
            Ok(Document::Program(program))
        }
        DocumentKind::Comments => match container.read_entry(COMMENTS_ENTRY) {
            Some(bytes) => Ok(Document::Comments(parse_entry(id, COMMENTS_ENTRY, bytes)?)),
            None => Ok(Document::Comments(CommentForest::new())),
        },
    }
}

fn mandatory_bytes<'c>(
    id: ProjectId,
    container: &'c Container,
    kind: DocumentKind,
) -> StoreResult<&'c [u8]> {
    container.read_entry(kind.entry_name()).ok_or_else(|| {
        error!(%id, entry = kind.entry_name(), "mandatory entry missing");
        StoreError::MissingDocument {
            id,
            entry: kind.entry_name(),
        }
    })
}

fn parse_mandatory<T: DeserializeOwned>(
    id: ProjectId,
    container: &Container,
    kind: DocumentKind,
) -> StoreResult<T> {
    let bytes = mandatory_bytes(id, container, kind)?;
    parse_entry(id, kind.entry_name(), bytes)
}

fn parse_entry<T: DeserializeOwned>(
    id: ProjectId,
    entry: &'static str,
    bytes: &[u8],
) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::Parse { id, entry, source })
}
