//! Operation facade for Stackblocks.
//!
//! This crate wires the container core together — document store, asset
//! registry, moderation gate, fork engine, one-time-action tracking — and
//! exposes the operations the route layer binds to: create, read, patch,
//! comment, reply, stat increments, fork, asset fetch, delete.
//!
//! Everything stateful is owned by [`ProjectService`]; construct one per
//! process and inject it into request handlers.

pub mod actions;
pub mod error;
pub mod service;

pub use actions::ActionTracker;
pub use error::{ServiceError, ServiceResult};
pub use service::{ProjectService, ProjectSummary, Requester, ServiceConfig};
