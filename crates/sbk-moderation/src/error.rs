use thiserror::Error;

/// Errors from moderation gate construction.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// A denylist term could not be turned into a matcher (empty after
    /// stripping separators, or the generated pattern failed to compile).
    #[error("unusable denylist term {term:?}: {reason}")]
    InvalidTerm { term: String, reason: String },

    /// The escalation schedule must have at least one step.
    #[error("escalation schedule is empty")]
    EmptySchedule,
}

/// Result alias for moderation operations.
pub type ModerationResult<T> = Result<T, ModerationError>;
