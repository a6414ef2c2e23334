//! Foundation types for Stackblocks.
//!
//! This crate provides the identity, metadata, and document types used
//! throughout the Stackblocks project store. Every other `sbk-*` crate
//! depends on `sbk-types`.
//!
//! # Key Types
//!
//! - [`ProjectId`] — Positive integer project identifier
//! - [`AssetId`] — Content identifier for a binary asset (`{hash}.{ext}`)
//! - [`ProjectToken`] — Opaque bearer token minted at project creation
//! - [`ProjectMetadata`] — The `data.json` document
//! - [`MetadataPatch`] — Whitelisted single-field metadata update
//! - [`Program`] — The `project.json` program graph (opaque except for
//!   embedded asset references)
//! - [`CommentForest`] — The `comments.json` document
//! - [`Notifier`] — Collaborator interface for outbound notifications

pub mod comments;
pub mod error;
pub mod ids;
pub mod metadata;
pub mod names;
pub mod notify;
pub mod program;

pub use comments::{CommentForest, CommentNode};
pub use error::TypeError;
pub use ids::{AssetId, ProjectId, ProjectToken};
pub use metadata::{
    Author, AuthorHistory, AuthorProfile, History, MetadataPatch, ProjectMetadata, RemixLineage,
    StatKind, Stats, Visibility,
};
pub use names::validate_username;
pub use notify::{Notifier, NullNotifier, RecordingNotifier};
pub use program::Program;
