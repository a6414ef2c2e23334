use std::time::Duration;

use sbk_assets::AssetError;
use sbk_fork::ForkError;
use sbk_moderation::{format_retry_after, BlockReason};
use sbk_store::StoreError;
use sbk_types::{ProjectId, TypeError};
use uuid::Uuid;

/// The full error taxonomy the route layer maps to response statuses.
///
/// `NotFound`-class and `Forbidden` are distinct so routes can answer
/// correctly; `Corrupt`/`MissingDocument` (inside [`ServiceError::Store`])
/// are server-side faults, already logged with their project id where they
/// were detected.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The named parent comment does not exist in the project's thread.
    #[error("parent comment {0} not found")]
    CommentNotFound(Uuid),

    /// The requester may not perform this operation on this project.
    #[error("forbidden")]
    Forbidden,

    /// The project's author has disabled comments.
    #[error("comments are closed for project {0}")]
    CommentsClosed(ProjectId),

    /// The moderation gate refused the write.
    #[error("{message}")]
    Blocked {
        message: String,
        retry_after: Duration,
    },

    /// A one-time action was already spent by this user.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invalid input (username, patch path, patch value, ...).
    #[error(transparent)]
    Invalid(#[from] TypeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Fork(#[from] ForkError),

    #[error(transparent)]
    Moderation(#[from] sbk_moderation::ModerationError),
}

impl ServiceError {
    /// Build the user-facing blocked error from a gate verdict.
    pub(crate) fn blocked(reason: BlockReason, retry_after: Duration) -> Self {
        let what = match reason {
            BlockReason::Suspended => "Your comments are temporarily disabled",
            BlockReason::DeniedTerm(_) => "This comment is not allowed",
        };
        Self::Blocked {
            message: format!("{what}. Try again in {}.", format_retry_after(retry_after)),
            retry_after,
        }
    }
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
