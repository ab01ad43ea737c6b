//! User-visible notifications (the toast sink).

use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Positive,
    Negative,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn positive(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Positive,
            message: message.into(),
        }
    }

    pub fn negative(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Negative,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

/// Receives every success and failure message raised by stores and the session.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log. Default for headless use.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Negative => tracing::warn!(message = %notification.message, "notification"),
            _ => tracing::info!(message = %notification.message, "notification"),
        }
    }
}

/// Keeps notifications in memory so a UI (or a test) can drain them.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        match self.inner.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        match self.inner.lock() {
            Ok(guard) => guard
                .iter()
                .filter(|n| n.level == level)
                .map(|n| n.message.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.push(notification);
        }
    }
}
