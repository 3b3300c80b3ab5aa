//! # Pipeline Configuration
//!
//! Process-wide configuration for the error/action pipeline, plus the merge
//! rules for partial updates and per-call display overrides.
//!
//! ## Merge Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Configuration Layering                              │
//! │                                                                         │
//! │  PipelineConfig::default()                                              │
//! │        │  update_config(ConfigPatch)  - shallow merge, whole fields     │
//! │        ▼                                                                │
//! │  effective PipelineConfig                                               │
//! │        │  handle(.., DisplayOverride) - per-call, display only          │
//! │        ▼                                                                │
//! │  DisplayOptions used for one notification                               │
//! │                                                                         │
//! │  Critical severity then OVERRIDES the override: persistent=true,        │
//! │  auto_close=None, no matter what the caller asked for.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No range validation happens here: a zero retry delay or a zero attempt
//! count is accepted as given. Callers own their numbers.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{DEFAULT_AUTO_CLOSE, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};

// =============================================================================
// Notification Position
// =============================================================================

/// Screen corner a notification is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyPosition {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

// =============================================================================
// Display Options
// =============================================================================

/// How a handled error is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Show a transient toast notification.
    pub show_toast: bool,
    /// Show a blocking modal instead of (or in addition to) the toast.
    pub show_modal: bool,
    /// Auto-dismiss delay. `None` means the notification stays until cleared.
    pub auto_close: Option<Duration>,
    pub position: NotifyPosition,
    /// Sticky notification that survives navigation.
    pub persistent: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            show_toast: true,
            show_modal: false,
            auto_close: Some(DEFAULT_AUTO_CLOSE),
            position: NotifyPosition::TopRight,
            persistent: false,
        }
    }
}

impl DisplayOptions {
    /// Applies a per-call override on top of these options.
    pub fn merged(&self, over: Option<&DisplayOverride>) -> DisplayOptions {
        let Some(over) = over else { return *self };
        DisplayOptions {
            show_toast: over.show_toast.unwrap_or(self.show_toast),
            show_modal: over.show_modal.unwrap_or(self.show_modal),
            auto_close: over.auto_close.or(self.auto_close),
            position: over.position.unwrap_or(self.position),
            persistent: over.persistent.unwrap_or(self.persistent),
        }
    }
}

/// Per-call display override passed to `handle`. Unset fields keep the
/// configured value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOverride {
    pub show_toast: Option<bool>,
    pub show_modal: Option<bool>,
    pub auto_close: Option<Duration>,
    pub position: Option<NotifyPosition>,
    pub persistent: Option<bool>,
}

// =============================================================================
// Pipeline Config
// =============================================================================

/// Process-wide pipeline configuration.
///
/// Initialized once at startup with defaults; mutated only through
/// `update_config`, which shallow-merges a [`ConfigPatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Emit a structured log entry for every handled error.
    pub enable_logging: bool,
    /// Submit redacted copies to the remote reporting endpoint.
    pub enable_reporting: bool,
    pub display: DisplayOptions,
    /// Default retry attempt ceiling when the caller does not supply one.
    pub max_retries: u32,
    /// Fixed inter-attempt delay (linear, not exponential).
    pub retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            enable_logging: true,
            enable_reporting: false,
            display: DisplayOptions::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl PipelineConfig {
    /// Shallow-merges a patch: set fields replace, unset fields keep.
    ///
    /// `display` is replaced as a whole when present (shallow, not deep).
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(enable_logging) = patch.enable_logging {
            self.enable_logging = enable_logging;
        }
        if let Some(enable_reporting) = patch.enable_reporting {
            self.enable_reporting = enable_reporting;
        }
        if let Some(display) = patch.display {
            self.display = display;
        }
        if let Some(max_retries) = patch.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(retry_delay) = patch.retry_delay {
            self.retry_delay = retry_delay;
        }
    }
}

/// Partial update for [`PipelineConfig`]. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub enable_logging: Option<bool>,
    pub enable_reporting: Option<bool>,
    pub display: Option<DisplayOptions>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<Duration>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.enable_logging);
        assert!(!config.enable_reporting);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
        assert!(config.display.show_toast);
        assert!(!config.display.persistent);
        assert_eq!(config.display.auto_close, Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_merge_replaces_only_set_fields() {
        let mut config = PipelineConfig::default();
        config.merge(ConfigPatch {
            max_retries: Some(5),
            enable_reporting: Some(true),
            ..Default::default()
        });
        assert_eq!(config.max_retries, 5);
        assert!(config.enable_reporting);
        // Untouched fields keep their values.
        assert!(config.enable_logging);
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_merge_accepts_degenerate_values() {
        // No range validation: caller-owned numbers pass through as given.
        let mut config = PipelineConfig::default();
        config.merge(ConfigPatch {
            max_retries: Some(0),
            retry_delay: Some(Duration::ZERO),
            ..Default::default()
        });
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.retry_delay, Duration::ZERO);
    }

    #[test]
    fn test_display_override_merge() {
        let base = DisplayOptions::default();
        let merged = base.merged(Some(&DisplayOverride {
            persistent: Some(true),
            auto_close: Some(Duration::from_millis(2000)),
            ..Default::default()
        }));
        assert!(merged.persistent);
        assert_eq!(merged.auto_close, Some(Duration::from_millis(2000)));
        assert!(merged.show_toast);
        assert_eq!(merged.position, NotifyPosition::TopRight);
    }

    #[test]
    fn test_no_override_is_identity() {
        let base = DisplayOptions::default();
        assert_eq!(base.merged(None), base);
    }
}
