//! Asset registry for Stackblocks.
//!
//! Binary assets (costume images, sounds) are addressed by content
//! identifier — `{hash}.{ext}` — both inside project containers and in the
//! serving store. This crate provides:
//!
//! - [`AssetStore`] — the pluggable blob backend ([`InMemoryAssetStore`],
//!   [`FsAssetStore`])
//! - [`AssetRegistry`] — read-through fetch/put used by the serving layer
//! - [`mint_renamed`] — fork-time replacement identifiers that preserve the
//!   extension and cannot collide with anything already taken
//! - [`rewrite_references`] — lockstep substitution of `assetId`/`md5ext`
//!   fields inside a program graph

pub mod error;
pub mod registry;
pub mod rewrite;
pub mod store;

pub use error::{AssetError, AssetResult};
pub use registry::{mint_renamed, AssetRegistry};
pub use rewrite::{rewrite_references, RewriteReport};
pub use store::{AssetStore, FsAssetStore, InMemoryAssetStore};
