//! # Bounded Retry
//!
//! Retry wrapper for asynchronous operations: a hard attempt ceiling, a
//! constant inter-attempt delay, and a cancellation token so a caller can
//! abort outstanding retries mid-delay.
//!
//! ## Retry Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         retry(op, trigger)                              │
//! │                                                                         │
//! │  trigger not retryable ─────────────►  Err(trigger), op NEVER called    │
//! │                                                                         │
//! │  attempt 1 ── op() ── Ok ───────────►  Ok(value)                        │
//! │       │                                                                 │
//! │      Err ── reclassify ── not retryable ──►  Err(composed)              │
//! │       │                                                                 │
//! │      delay (constant, cancellable) ── cancelled ──►  Err(composed)      │
//! │       │                                                                 │
//! │  attempt 2 ... attempt N  ──────────►  Err(composed: attempts, id)      │
//! │                                                                         │
//! │  DELAY STRATEGY: constant (linear), retry_delay from config             │
//! │  Attempt 1: immediate │ Attempt 2: +1s │ Attempt 3: +1s │ ...           │
//! │  The ceiling is hard - the loop can never run unbounded.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The caller-supplied attempt count is authoritative when present; the
//! config default (3) applies only when the caller omits it.

use backoff::backoff::{Backoff, Constant};
use keel_core::classify::classify;
use keel_core::error::{AppError, RawFailure, Severity};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;

use crate::handler::ErrorPipeline;

// =============================================================================
// Cancellation
// =============================================================================

/// Cancels in-flight retry delays. Dropping the guard cancels too, so tying
/// it to the initiating scope (a view, a request) aborts outstanding retries
/// when that scope goes away.
pub struct CancelGuard {
    tx: watch::Sender<bool>,
}

impl CancelGuard {
    /// Explicit cancellation. Equivalent to dropping the guard.
    pub fn cancel(self) {}
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(true);
    }
}

/// Observes a [`CancelGuard`]. Cloneable; all clones fire together.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
    /// Keeps the sender alive for tokens that can never fire.
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl CancelToken {
    /// A guard/token pair.
    pub fn pair() -> (CancelGuard, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (
            CancelGuard { tx },
            CancelToken {
                rx,
                _keepalive: None,
            },
        )
    }

    /// A token that never fires, for callers with no cancellation scope.
    pub fn never() -> CancelToken {
        let (tx, rx) = watch::channel(false);
        CancelToken {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    /// True once the guard has been cancelled or dropped.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancelled. Pends forever for [`CancelToken::never`].
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            // Err means the guard was dropped, which cancels.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

// =============================================================================
// Retry on the Pipeline
// =============================================================================

impl ErrorPipeline {
    /// Retries `operation` up to the attempt ceiling with a constant delay
    /// between attempts. See [`retry_with_cancel`](Self::retry_with_cancel).
    pub async fn retry<T, Op, Fut>(
        &self,
        operation: Op,
        trigger: &AppError,
        max_attempts: Option<u32>,
    ) -> Result<T, AppError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        self.retry_with_cancel(operation, trigger, max_attempts, &CancelToken::never())
            .await
    }

    /// Cancellable bounded retry.
    ///
    /// - A non-retryable `trigger` (validation, unknown, or critical) is
    ///   returned unchanged without a single call to `operation`.
    /// - `max_attempts` is authoritative when given; otherwise the config's
    ///   `max_retries` applies. The bound is hard.
    /// - Every new failure is reclassified; a non-retryable one stops the
    ///   loop early.
    /// - Exhaustion (or early stop) returns a composed error wrapping the
    ///   last failure, with `attempts` and `original_error_id` in details.
    /// - Cancellation during a delay returns a composed error immediately;
    ///   an attempt already in flight runs to completion first.
    pub async fn retry_with_cancel<T, Op, Fut>(
        &self,
        mut operation: Op,
        trigger: &AppError,
        max_attempts: Option<u32>,
        cancel: &CancelToken,
    ) -> Result<T, AppError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        if !trigger.is_retryable() {
            debug!(error_id = %trigger.id, category = %trigger.category, "trigger is not retryable");
            return Err(trigger.clone());
        }

        let config = self.config();
        let ceiling = max_attempts.unwrap_or(config.max_retries);
        let mut delays = Constant::new(config.retry_delay);
        let mut last = trigger.clone();
        let mut attempts = 0u32;

        while attempts < ceiling {
            if attempts > 0 {
                let wait = delays.next_backoff().unwrap_or(config.retry_delay);
                tokio::select! {
                    _ = sleep(wait) => {}
                    _ = cancel.cancelled() => {
                        debug!(error_id = %trigger.id, attempts, "retry cancelled mid-delay");
                        return Err(composed_cancelled(attempts, trigger, &last));
                    }
                }
            }

            attempts += 1;
            match operation().await {
                Ok(value) => {
                    debug!(error_id = %trigger.id, attempts, "operation recovered");
                    return Ok(value);
                }
                Err(raw) => {
                    last = classify(raw);
                    debug!(
                        error_id = %trigger.id,
                        attempt = attempts,
                        failure = %last,
                        "retry attempt failed"
                    );
                    if !last.is_retryable() {
                        break;
                    }
                }
            }
        }

        Err(composed_exhausted(attempts, trigger, &last))
    }
}

/// The error thrown when the ceiling is reached (or a non-retryable failure
/// stops the loop).
fn composed_exhausted(attempts: u32, trigger: &AppError, last: &AppError) -> AppError {
    AppError::new(
        last.category,
        Severity::Error,
        format!("Operation failed after {attempts} attempts: {}", last.message),
    )
    .with_detail("attempts", attempts)
    .with_detail("original_error_id", trigger.id.to_string())
}

/// The error thrown when the caller's cancellation scope fires mid-delay.
fn composed_cancelled(attempts: u32, trigger: &AppError, last: &AppError) -> AppError {
    AppError::new(
        last.category,
        Severity::Warning,
        format!("Operation cancelled after {attempts} attempts: {}", last.message),
    )
    .with_detail("attempts", attempts)
    .with_detail("cancelled", true)
    .with_detail("original_error_id", trigger.id.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
