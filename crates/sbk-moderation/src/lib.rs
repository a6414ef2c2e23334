//! Moderation gate for Stackblocks comment writes.
//!
//! Every comment or reply must pass through the gate before it is written.
//! The gate does two things:
//!
//! - **Classification**: text is matched against a denylist with matchers
//!   tolerant of separator-character obfuscation (`b.a.d.w.o.r.d`),
//!   case-insensitive and word-bounded.
//! - **Escalation**: each recorded violation extends a per-user suspension
//!   window on a weekly schedule — 5, 10, 15, 30, 60, then 180 minutes per
//!   strike within one ISO week, resetting when the week rolls over.
//!
//! State lives inside the [`ModerationGate`] object and is injected where
//! needed; it is per-process and intentionally does not survive restarts.

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod matcher;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ModerationConfig;
pub use error::{ModerationError, ModerationResult};
pub use gate::{format_retry_after, BlockReason, ModerationGate, Verdict};
pub use matcher::DenylistMatcher;
