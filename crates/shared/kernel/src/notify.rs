//! User-facing failure notifications.

use parking_lot::Mutex;
use std::borrow::Cow;
use std::fmt::Debug;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Task that produced the failure.
    pub title: Cow<'static, str>,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn new(title: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self { title: title.into(), message: message.into() }
    }
}

/// Sink for failure notifications. Notifying never fails and never blocks long.
pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, notification: Notification);
}

/// Reports notifications as `Error: <message>` on the error log level.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        error!(task = %notification.title, "Error: {}", notification.message);
    }
}

/// Keeps notifications in memory; for tests and embedders that render them.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    /// Drains recorded notifications.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.entries.lock().push(notification);
    }
}
