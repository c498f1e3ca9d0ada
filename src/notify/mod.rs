//! User-facing error reporting.

mod classify;

use std::sync::{Arc, RwLock};
use std::time::Duration;

pub use classify::{
    DEFAULT_NOTIFICATION_DURATION, FALLBACK_MESSAGE, classify_response, duration_for, status_message,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// `None` means the message stays until dismissed.
    pub duration: Option<Duration>,
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn notify(&self, notification: &Notification) {
        self(notification)
    }
}

/// Single-subscriber slot. Setting a sink drops the previous one.
#[derive(Default)]
pub struct NotificationSlot {
    sink: RwLock<Option<Arc<dyn NotificationSink>>>,
}

impl NotificationSlot {
    pub fn set(&self, sink: Option<Arc<dyn NotificationSink>>) {
        *self
            .sink
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = sink;
    }

    pub fn is_set(&self) -> bool {
        self.current().is_some()
    }

    pub fn emit(&self, notification: Notification) {
        // Clone out of the lock so a sink may replace itself while being called.
        if let Some(sink) = self.current() {
            sink.notify(&notification);
        }
    }

    fn current(&self) -> Option<Arc<dyn NotificationSink>> {
        self.sink
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
