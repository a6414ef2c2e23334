use thiserror::Error;

/// Errors produced by type parsing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid project id: {0:?}")]
    InvalidProjectId(String),

    #[error("invalid asset identifier {id:?}: {reason}")]
    InvalidAssetId { id: String, reason: String },

    #[error("invalid visibility value: {0:?}")]
    InvalidVisibility(String),

    #[error("invalid username {name:?}: {reason}")]
    InvalidUsername { name: String, reason: String },

    #[error("metadata path {0:?} is not patchable")]
    PatchPathNotAllowed(String),

    #[error("patch value for {path:?} must be a {expected}")]
    PatchValue {
        path: String,
        expected: &'static str,
    },
}
