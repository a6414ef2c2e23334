use sbk_types::AssetId;

/// Errors from asset storage operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// No blob stored under this identifier.
    #[error("asset {0} not found")]
    NotFound(AssetId),

    /// I/O error from the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
