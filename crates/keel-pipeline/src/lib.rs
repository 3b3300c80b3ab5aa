//! # keel-pipeline: Async Error/Action Pipeline for Keel
//!
//! This crate provides the two collaborating subsystems behind every admin
//! action: the **Permission Resolver** (may this user even be offered the
//! action?) and the **Error Pipeline** (what happens when the action fails?).
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pipeline Architecture                              │
//! │                                                                         │
//! │  UI action ("cancel subscription")                                      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌────────────────────┐   can(SubscriptionCancel)?                      │
//! │  │ PermissionResolver │ ◄── RoleLookup (pluggable policy)               │
//! │  │ fail-closed Viewer │                                                 │
//! │  └─────────┬──────────┘                                                 │
//! │            │ permitted                                                  │
//! │            ▼                                                            │
//! │  ┌────────────────────┐   async REST call (opaque to this crate)        │
//! │  │   ErrorPipeline    │                                                 │
//! │  │                    │   ┌──────────────┐  ┌───────────────────────┐   │
//! │  │  handle / classify │──►│ Notifier     │  │ ErrorReporter (HTTP)  │   │
//! │  │  retry (bounded,   │   │ toast/modal  │  │ fire-and-forget       │   │
//! │  │  cancellable)      │   │ dedupe by id │  │ failures swallowed    │   │
//! │  └────────────────────┘   └──────────────┘  └───────────────────────┘   │
//! │                                                                         │
//! │  Global hooks: panic hook feeding handle(), installed at most once      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`resolver`] - Role resolution and capability checks
//! - [`handler`] - The `ErrorPipeline` store (classify, list, notify, report)
//! - [`retry`] - Bounded, cancellable retry with a constant delay
//! - [`notify`] - The notification surface seam
//! - [`report`] - Remote error reporting (HTTP POST, redacted payloads)
//! - [`global`] - Idempotent process-wide panic hook attachment
//! - [`error`] - Pipeline infrastructure error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keel_core::{Capability, PipelineConfig};
//! use keel_pipeline::{ErrorPipeline, PermissionResolver, TracingNotifier};
//! use std::sync::Arc;
//!
//! let resolver = PermissionResolver::new();
//! let pipeline = Arc::new(ErrorPipeline::new(
//!     PipelineConfig::default(),
//!     Arc::new(TracingNotifier),
//! ));
//!
//! resolver.resolve(Some(&tenant), Some(&user)).await;
//! if resolver.can(Capability::CancelSubscription) {
//!     let trigger = pipeline.handle(failure, None);
//!     let value = pipeline.retry(|| cancel_subscription(), &trigger, None).await?;
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod global;
pub mod handler;
pub mod notify;
pub mod report;
pub mod resolver;
pub mod retry;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{LookupError, ReportError};
pub use global::{hooks_installed, install_global_hooks};
pub use handler::ErrorPipeline;
pub use notify::{Notification, Notifier, NoopNotifier, TracingNotifier};
pub use report::{ErrorReport, ErrorReporter, HttpReporter, ReportContext, ReportedError};
pub use resolver::{
    CreatorHeuristic, CurrentUser, PermissionResolver, RoleLookup, TenantContext,
};
pub use retry::{CancelGuard, CancelToken};
