//! # Roles
//!
//! Tenant-scoped roles and the resolution state machine.
//!
//! ## Role Ladder
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tenant Roles                                     │
//! │                                                                         │
//! │   Owner   ──►  full control, including subscription cancellation        │
//! │   Admin   ──►  everything Owner can do, minus cancelling the plan       │
//! │   Staff   ──►  operates the register; no tenant administration          │
//! │   Viewer  ──►  read-nothing fallback; the fail-closed default           │
//! │                                                                         │
//! │   Resolution failures ALWAYS degrade to Viewer (least privilege).       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Resolution State Machine
//! Two states, `Resolving` → `Resolved`. Re-enters `Resolving` whenever the
//! active tenant identity changes. While resolving, the effective role is
//! `Viewer` so an in-flight lookup never exposes stale elevated access.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Role
// =============================================================================

/// A user's role within the active tenant.
///
/// Immutable once assigned; attached to a (user, tenant) pair. Exactly four
/// values exist and the set is closed by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Tenant creator. Full control of billing, users, and subscription.
    Owner,
    /// Trusted administrator. Everything except cancelling the subscription.
    Admin,
    /// Register operator. No tenant administration capabilities.
    Staff,
    /// Least privilege. The fallback for unauthenticated or failed lookups.
    Viewer,
}

impl Role {
    /// All roles, in privilege order (most to least).
    pub const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Staff, Role::Viewer];

    /// Stable string form (matches the serde representation).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Viewer => "viewer",
        }
    }

    /// True iff this role is allowed onto the admin dashboard.
    pub const fn has_dashboard_access(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized role strings.
///
/// Callers that must not fail map this to [`Role::Viewer`] (fail-closed).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "viewer" => Ok(Role::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// =============================================================================
// Resolution State
// =============================================================================

/// Where the resolver is in its two-state lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionState {
    /// A lookup for the current tenant is in flight.
    Resolving,
    /// The role below is final for the current tenant identity.
    Resolved,
}

/// Per-session derived state: the resolved role plus the lifecycle flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResolution {
    pub role: Role,
    pub state: ResolutionState,
}

impl RoleResolution {
    /// Initial state: `Viewer` until resolution completes.
    pub const fn resolving() -> Self {
        RoleResolution {
            role: Role::Viewer,
            state: ResolutionState::Resolving,
        }
    }

    /// Final state for the current tenant identity.
    pub const fn resolved(role: Role) -> Self {
        RoleResolution {
            role,
            state: ResolutionState::Resolved,
        }
    }

    /// True while a lookup is in flight.
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, ResolutionState::Resolving)
    }
}

impl Default for RoleResolution {
    fn default() -> Self {
        RoleResolution::resolving()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
