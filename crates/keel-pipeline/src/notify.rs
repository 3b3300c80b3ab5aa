//! # Notification Surface
//!
//! The seam between the pipeline and whatever renders notifications. The
//! pipeline builds a [`Notification`] and hands it to a [`Notifier`]; it
//! never knows how (or whether) the host draws it.
//!
//! At most one notification is requested per distinct error id; the dedupe
//! key is the id itself.

use keel_core::{NotifyPosition, Severity};
use std::time::Duration;
use uuid::Uuid;

/// A single notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Dedupe key: the AppError id. Hosts showing notifications keyed by this
    /// value render each error at most once.
    pub dedupe_key: Uuid,
    pub message: String,
    pub severity: Severity,
    /// `None` means the notification stays until explicitly cleared.
    pub auto_close: Option<Duration>,
    pub position: NotifyPosition,
    /// Sticky notification that survives navigation.
    pub persistent: bool,
}

/// Renders (or forwards) notifications. Implementations must not block and
/// must not fail: a broken surface is the host's problem, not the pipeline's.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// No-op notifier for tests and headless hosts.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: &Notification) {}
}

/// Notifier that writes notifications to the tracing channel.
///
/// Useful for headless services and as the explicit diagnostic-channel
/// subscriber; nothing here touches platform globals.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Info => tracing::info!(
                id = %notification.dedupe_key,
                persistent = notification.persistent,
                "{}", notification.message
            ),
            Severity::Warning => tracing::warn!(
                id = %notification.dedupe_key,
                persistent = notification.persistent,
                "{}", notification.message
            ),
            Severity::Error | Severity::Critical => tracing::error!(
                id = %notification.dedupe_key,
                severity = %notification.severity,
                persistent = notification.persistent,
                "{}", notification.message
            ),
        }
    }
}

/// Notifier that records every request, for assertions in tests.
#[cfg(test)]
pub(crate) struct RecordingNotifier {
    pub(crate) seen: std::sync::Mutex<Vec<Notification>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub(crate) fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(RecordingNotifier {
            seen: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn taken(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notification.clone());
    }
}
