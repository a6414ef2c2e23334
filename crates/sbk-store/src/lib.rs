//! Archive-backed document store for Stackblocks projects.
//!
//! A project is one multi-entry container (see `sbk-archive`) holding three
//! logical documents — metadata, program graph, comment forest — plus
//! binary assets. This crate turns raw container bytes into safe
//! per-document reads and writes:
//!
//! - [`ContainerStore`] is the pluggable byte-level backend (strategy
//!   pattern): [`InMemoryContainerStore`] for tests and embedding,
//!   [`FsContainerStore`] for the local `{id}.sb3` directory layout.
//!   Remote backends (object-store or database persistence) implement the
//!   same trait outside this crate.
//! - [`DocumentStore`] layers document parsing, per-id write serialization,
//!   and id allocation on top of any backend.
//!
//! # Design Rules
//!
//! 1. Replacing one document must leave every other entry byte-identical.
//! 2. All mutators for a given project id are serialized behind that id's
//!    lock; operations on different ids never contend.
//! 3. The per-id lock is released before any collaborator is called.
//! 4. "Document absent" (optional comments) and "container damaged"
//!    (missing mandatory entry, unreadable archive) are distinct errors.
//! 5. Corruption-class failures are logged with the project id.

pub mod document;
pub mod error;
pub mod fs;
mod locks;
pub mod memory;
pub mod store;
pub mod traits;

pub use document::{Document, DocumentKind};
pub use error::{StoreError, StoreResult};
pub use fs::FsContainerStore;
pub use memory::InMemoryContainerStore;
pub use store::{DocumentStore, ProjectHandle};
pub use traits::ContainerStore;
