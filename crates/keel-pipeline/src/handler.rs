//! # Error Pipeline Store
//!
//! The process-wide error/action pipeline: classifies failures, keeps the
//! session's error list, applies the display policy, and fires reports.
//!
//! ## Handle Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         handle(raw, override)                           │
//! │                                                                         │
//! │   raw failure ──► classify ──► append to error list (in call order)     │
//! │                       │                                                 │
//! │                       ├── enable_logging ──► structured tracing entry   │
//! │                       │                                                 │
//! │                       ├── display policy ──► Notifier (deduped by id)   │
//! │                       │     critical ⇒ persistent, no auto-close        │
//! │                       │                                                 │
//! │                       └── enable_reporting ──► tokio::spawn(report)     │
//! │                             fire-and-forget; failures logged+swallowed  │
//! │                                                                         │
//! │   returns the AppError synchronously - reporting never blocks it        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline is an explicitly constructed object, not a module global:
//! hosts build one at their composition root and share it via `Arc`. That
//! keeps tests isolated and parallel-safe.

use keel_core::classify::classify;
use keel_core::config::{ConfigPatch, DisplayOverride, PipelineConfig};
use keel_core::error::{AppError, RawFailure, Severity};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::notify::{Notification, Notifier, NoopNotifier};
use crate::report::{ErrorReport, ErrorReporter, ReportContext};

/// The error/action pipeline store.
///
/// All shared mutable state (the error list, the config, the dedupe set)
/// lives here, behind locks that are never held across an await point.
/// `handle` is callable from sync and async contexts alike.
pub struct ErrorPipeline {
    config: RwLock<PipelineConfig>,
    errors: RwLock<Vec<AppError>>,
    /// Error ids already surfaced once; at most one notification per id.
    notified: RwLock<HashSet<Uuid>>,
    notifier: Arc<dyn Notifier>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    report_context: ReportContext,
}

impl ErrorPipeline {
    /// Pipeline with the given config and notification surface.
    pub fn new(config: PipelineConfig, notifier: Arc<dyn Notifier>) -> Self {
        ErrorPipeline {
            config: RwLock::new(config),
            errors: RwLock::new(Vec::new()),
            notified: RwLock::new(HashSet::new()),
            notifier,
            reporter: None,
            report_context: ReportContext::default(),
        }
    }

    /// Headless pipeline with defaults; notifications are dropped.
    pub fn headless() -> Self {
        Self::new(PipelineConfig::default(), Arc::new(NoopNotifier))
    }

    /// Attaches a remote reporter. Reports are only sent while
    /// `enable_reporting` is set in the config.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Overrides the context stamped onto reports.
    pub fn with_report_context(mut self, context: ReportContext) -> Self {
        self.report_context = context;
        self
    }

    // =========================================================================
    // Handle
    // =========================================================================

    /// Classifies a failure, records it, surfaces it, and (optionally)
    /// reports it. Returns the normalized record synchronously; reporting is
    /// fire-and-forget.
    pub fn handle(
        &self,
        raw: impl Into<RawFailure>,
        display: Option<DisplayOverride>,
    ) -> AppError {
        let err = classify(raw.into());

        self.errors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(err.clone());

        let config = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if config.enable_logging {
            log_handled(&err);
        }

        self.display(&err, &config, display.as_ref());

        if config.enable_reporting {
            self.spawn_report(&err);
        }

        err
    }

    /// Applies the display policy and requests at most one notification per
    /// error id.
    fn display(
        &self,
        err: &AppError,
        config: &PipelineConfig,
        over: Option<&DisplayOverride>,
    ) {
        let merged = config.display.merged(over);
        if !merged.show_toast && !merged.show_modal {
            return;
        }

        // Critical demands attention: sticky and never auto-dismissed, no
        // matter what the caller asked for.
        let (auto_close, persistent) = if err.severity == Severity::Critical {
            (None, true)
        } else {
            (merged.auto_close, merged.persistent)
        };

        let first_time = self
            .notified
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(err.id);
        if !first_time {
            return;
        }

        self.notifier.notify(&Notification {
            dedupe_key: err.id,
            message: err.message.clone(),
            severity: err.severity,
            auto_close,
            position: merged.position,
            persistent,
        });
    }

    /// Fires the report on the current runtime. With no runtime in scope the
    /// report is skipped with a warning; `handle` itself never fails.
    fn spawn_report(&self, err: &AppError) {
        let Some(reporter) = self.reporter.clone() else {
            return;
        };
        let report = ErrorReport::new(err, &self.report_context);
        let id = err.id;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(report_err) = reporter.report(&report).await {
                        // Swallowed: reporting must never surface to the
                        // caller of handle().
                        warn!(error_id = %id, error = %report_err, "error report failed");
                    }
                });
            }
            Err(_) => {
                warn!(error_id = %id, "no async runtime in scope, skipping error report");
            }
        }
    }

    // =========================================================================
    // List Management
    // =========================================================================

    /// Removes one entry by id and releases its notification dedupe slot.
    /// Pure bookkeeping, never fails.
    pub fn clear(&self, id: Uuid) {
        self.errors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|e| e.id != id);
        self.notified
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    /// Empties the list and the dedupe set.
    pub fn clear_all(&self) {
        self.errors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.notified
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Snapshot of the session's errors, in the order they were handled.
    pub fn errors(&self) -> Vec<AppError> {
        self.errors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Shallow-merges a partial config update.
    pub fn update_config(&self, patch: ConfigPatch) {
        self.config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(patch);
    }

    /// Snapshot of the current config.
    pub fn config(&self) -> PipelineConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Structured log entry for a handled error, leveled by severity.
fn log_handled(err: &AppError) {
    match err.severity {
        Severity::Info => info!(
            id = %err.id,
            category = %err.category,
            details = %serde_json::Value::Object(err.details.clone()),
            "{}", err.message
        ),
        Severity::Warning => warn!(
            id = %err.id,
            category = %err.category,
            details = %serde_json::Value::Object(err.details.clone()),
            "{}", err.message
        ),
        Severity::Error | Severity::Critical => error!(
            id = %err.id,
            category = %err.category,
            severity = %err.severity,
            details = %serde_json::Value::Object(err.details.clone()),
            "{}", err.message
        ),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::notify::RecordingNotifier;
    use async_trait::async_trait;
    use keel_core::{Category, DEFAULT_AUTO_CLOSE};
    use serde_json::json;
    use std::time::Duration;

    fn pipeline_with_recorder() -> (ErrorPipeline, Arc<RecordingNotifier>) {
        let recorder = RecordingNotifier::new();
        let pipeline = ErrorPipeline::new(PipelineConfig::default(), recorder.clone());
        (pipeline, recorder)
    }

    #[test]
    fn test_handle_returns_classified_error_and_toasts() {
        let (pipeline, recorder) = pipeline_with_recorder();

        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = pipeline.handle(RawFailure::from_error(io), None);

        assert_eq!(err.category, Category::Unknown);
        assert_eq!(err.severity, Severity::Error);

        let seen = recorder.taken();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].dedupe_key, err.id);
        assert_eq!(seen[0].auto_close, Some(DEFAULT_AUTO_CLOSE));
        assert!(!seen[0].persistent);
    }

    #[test]
    fn test_errors_are_listed_in_handle_order() {
        let (pipeline, _) = pipeline_with_recorder();

        let first = pipeline.handle("first", None);
        let second = pipeline.handle("second", None);
        let third = pipeline.handle("third", None);

        let ids: Vec<_> = pipeline.errors().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn test_critical_forces_persistent_despite_override() {
        let (pipeline, recorder) = pipeline_with_recorder();

        // An escalated payload, through the one public entry point.
        let err = pipeline.handle(
            json!({
                "message": "payment ledger write failed",
                "status": 500,
                "severity": "critical",
            }),
            Some(DisplayOverride {
                auto_close: Some(Duration::from_millis(2000)),
                persistent: Some(false),
                ..Default::default()
            }),
        );
        assert_eq!(err.severity, Severity::Critical);

        let seen = recorder.taken();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].dedupe_key, err.id);
        assert_eq!(seen[0].auto_close, None);
        assert!(seen[0].persistent);
    }

    #[test]
    fn test_at_most_one_notification_per_error_id() {
        let (pipeline, recorder) = pipeline_with_recorder();

        let err = keel_core::AppError::new(Category::Api, Severity::Error, "flaky");
        let config = pipeline.config();
        pipeline.display(&err, &config, None);
        pipeline.display(&err, &config, None);

        assert_eq!(recorder.taken().len(), 1);
    }

    #[test]
    fn test_display_suppressed_when_both_surfaces_off() {
        let (pipeline, recorder) = pipeline_with_recorder();
        pipeline.handle(
            "quiet failure",
            Some(DisplayOverride {
                show_toast: Some(false),
                show_modal: Some(false),
                ..Default::default()
            }),
        );
        assert!(recorder.taken().is_empty());
    }

    #[test]
    fn test_clear_and_clear_all() {
        let (pipeline, _) = pipeline_with_recorder();

        let a = pipeline.handle("a", None);
        let b = pipeline.handle("b", None);

        pipeline.clear(a.id);
        let ids: Vec<_> = pipeline.errors().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b.id]);

        pipeline.clear_all();
        assert!(pipeline.errors().is_empty());
    }

    #[test]
    fn test_clear_releases_the_dedupe_slot() {
        let (pipeline, recorder) = pipeline_with_recorder();

        let err = pipeline.handle("flaky save", None);
        assert_eq!(recorder.taken().len(), 1);

        // Once cleared, the same record may surface again.
        pipeline.clear(err.id);
        let config = pipeline.config();
        pipeline.display(&err, &config, None);
        assert_eq!(recorder.taken().len(), 2);

        pipeline.clear_all();
        pipeline.display(&err, &config, None);
        assert_eq!(recorder.taken().len(), 3);
    }

    #[test]
    fn test_update_config_shallow_merges() {
        let (pipeline, _) = pipeline_with_recorder();
        pipeline.update_config(ConfigPatch {
            max_retries: Some(7),
            ..Default::default()
        });
        let config = pipeline.config();
        assert_eq!(config.max_retries, 7);
        assert!(config.enable_logging);
    }

    struct ChannelReporter {
        tx: tokio::sync::mpsc::UnboundedSender<ErrorReport>,
        fail: bool,
    }

    #[async_trait]
    impl ErrorReporter for ChannelReporter {
        async fn report(&self, report: &ErrorReport) -> Result<(), ReportError> {
            self.tx
                .send(report.clone())
                .map_err(|e| ReportError::Transport(e.to_string()))?;
            if self.fail {
                return Err(ReportError::Status(503));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reporting_is_fire_and_forget() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let pipeline = ErrorPipeline::headless()
            .with_reporter(Arc::new(ChannelReporter { tx, fail: false }));
        pipeline.update_config(ConfigPatch {
            enable_reporting: Some(true),
            ..Default::default()
        });

        let err = pipeline.handle(json!({ "status": 500, "message": "api down" }), None);

        // handle() already returned; the report arrives asynchronously.
        let report = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("report sent")
            .expect("channel open");
        assert_eq!(report.error.id, err.id.to_string());
        assert_eq!(report.error.category, Category::Api);
    }

    #[tokio::test]
    async fn test_reporting_failure_is_swallowed() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let pipeline = ErrorPipeline::headless()
            .with_reporter(Arc::new(ChannelReporter { tx, fail: true }));
        pipeline.update_config(ConfigPatch {
            enable_reporting: Some(true),
            ..Default::default()
        });

        // No panic, no error surfaced; the record is still kept locally.
        let err = pipeline.handle("report me", None);
        assert_eq!(pipeline.errors().len(), 1);

        let report = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("report attempted")
            .expect("channel open");
        assert_eq!(report.error.id, err.id.to_string());
    }

    #[test]
    fn test_reporting_without_runtime_is_skipped() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let pipeline = ErrorPipeline::headless()
            .with_reporter(Arc::new(ChannelReporter { tx, fail: false }));
        pipeline.update_config(ConfigPatch {
            enable_reporting: Some(true),
            ..Default::default()
        });

        // Plain #[test]: no tokio runtime. handle() must still succeed.
        let err = pipeline.handle("no runtime", None);
        assert_eq!(pipeline.errors().len(), 1);
        assert_eq!(err.category, Category::Unknown);
    }
}
