use sbk_types::ProjectId;

/// Errors from document store operations.
///
/// `NotFound` is a plain client-facing miss. `Corrupt` and
/// `MissingDocument` are server-side faults: the container exists but its
/// contents are damaged, and both are logged with the project id so an
/// operator can follow up.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No container exists for this project id.
    #[error("project {0} not found")]
    NotFound(ProjectId),

    /// The container bytes could not be decoded at all.
    #[error("project {id} container is corrupt: {reason}")]
    Corrupt { id: ProjectId, reason: String },

    /// The container decodes but lacks a mandatory entry — signals prior
    /// data damage, distinct from a plain NotFound.
    #[error("project {id} is missing mandatory entry {entry:?}")]
    MissingDocument { id: ProjectId, entry: &'static str },

    /// An entry's bytes are not valid JSON for its document kind.
    #[error("project {id} entry {entry:?} failed to parse: {source}")]
    Parse {
        id: ProjectId,
        entry: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A document failed to serialize back to JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
