//! Outbound notification collaborator interface.
//!
//! Delivery (email, on-site inbox, ...) lives outside the core. The core
//! only ever fires and forgets: a notification failure must never fail the
//! operation that triggered it, so the interface is infallible and
//! implementations swallow (and log) their own errors.

use std::sync::Mutex;

use tracing::debug;

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    /// Deliver `html_message` to `username`. Must not block the caller for
    /// longer than it takes to enqueue.
    fn notify(&self, username: &str, html_message: &str);
}

/// A sink that drops everything (the default when no delivery backend is
/// configured).
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, username: &str, _html_message: &str) {
        debug!(%username, "notification dropped (no sink configured)");
    }
}

/// A sink that records every notification; for tests and embedding.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(username, html_message)` pairs delivered so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("lock poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, username: &str, html_message: &str) {
        self.sent
            .lock()
            .expect("lock poisoned")
            .push((username.to_string(), html_message.to_string()));
    }
}
