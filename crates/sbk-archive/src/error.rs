use thiserror::Error;

/// Errors from container encode/decode operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The container bytes are not a readable archive, or an entry's
    /// compressed stream is damaged.
    #[error("corrupt container: {0}")]
    Corrupt(String),

    /// Failure while writing the container back out.
    #[error("container serialization failed: {0}")]
    Serialize(String),

    /// I/O error from the underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
