//! # keel-core: Pure Access & Error Logic for Keel
//!
//! This crate is the **heart** of Keel's tenant-admin core. It contains the
//! role/capability model and the error taxonomy as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Keel Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Admin UI / API Handlers (host app)              │   │
//! │  │    settings ──► billing ──► users ──► audit ──► dashboard       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                keel-pipeline (async layer)                      │   │
//! │  │    PermissionResolver, ErrorPipeline, retry, reporting          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ keel-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   role    │  │ permission │  │   error   │  │  classify │  │   │
//! │  │   │   Role    │  │ Capability │  │ AppError  │  │  shape    │  │   │
//! │  │   │Resolution │  │PermissionSet│ │ Severity  │  │ detection │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`role`] - Tenant roles and the resolution state machine
//! - [`permission`] - The static Role → Capability matrix
//! - [`error`] - AppError taxonomy (severity × category) and RawFailure
//! - [`classify`] - Total classification of arbitrary failures
//! - [`config`] - Pipeline configuration and merge rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic apart from fresh
//!    ids and timestamps on new records
//! 2. **No I/O**: Database, network, timer access is FORBIDDEN here
//! 3. **Fail Closed**: Anything unresolvable degrades to `Viewer` / denies
//! 4. **Total Classification**: `classify` accepts anything and never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use keel_core::permission::{Capability, PermissionSet};
//! use keel_core::role::Role;
//!
//! let admin = PermissionSet::for_role(Role::Admin);
//!
//! // Admins run the tenant but cannot cancel the plan.
//! assert!(admin.allows(Capability::ManageUsers));
//! assert!(!admin.allows(Capability::CancelSubscription));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod classify;
pub mod config;
pub mod error;
pub mod permission;
pub mod role;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use keel_core::Role` instead of
// `use keel_core::role::Role`

pub use classify::classify;
pub use config::{ConfigPatch, DisplayOptions, DisplayOverride, NotifyPosition, PipelineConfig};
pub use error::{AppError, Category, RawFailure, Severity};
pub use permission::{Capability, PermissionSet};
pub use role::{ResolutionState, Role, RoleResolution, UnknownRole};

// =============================================================================
// Crate-Level Constants
// =============================================================================

use std::time::Duration;

/// Default retry attempt ceiling when neither caller nor config supplies one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed inter-attempt delay (linear, not exponential).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default auto-dismiss delay for non-critical notifications.
pub const DEFAULT_AUTO_CLOSE: Duration = Duration::from_millis(5000);
