//! # Capability Matrix
//!
//! The static Role → PermissionSet lookup table.
//!
//! ## Matrix
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Capability             Owner    Admin    Staff    Viewer               │
//! │  ─────────────────────  ─────    ─────    ─────    ──────               │
//! │  billing:manage           ✓        ✓        ✗        ✗                  │
//! │  users:manage             ✓        ✓        ✗        ✗                  │
//! │  stores:manage            ✓        ✓        ✗        ✗                  │
//! │  billing:view             ✓        ✓        ✗        ✗                  │
//! │  audit:view               ✓        ✓        ✗        ✗                  │
//! │  settings:manage          ✓        ✓        ✗        ✗                  │
//! │  subscription:cancel      ✓        ✗        ✗        ✗                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Admin's set is DERIVED from Owner's (`Owner minus subscription:cancel`),
//! so Owner ⊇ Admin holds by construction and cannot drift as the table is
//! edited. Staff and Viewer hold none of the tenant-administration bits.
//!
//! This is process-wide constant data. No persistence, no runtime mutation.

use crate::role::Role;
use serde::{Deserialize, Serialize};

// =============================================================================
// Capability
// =============================================================================

/// A single named permission bit, scoped to tenant administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Change payment methods and plans.
    ManageBilling,
    /// Invite, remove, and re-role tenant users.
    ManageUsers,
    /// Create and configure stores.
    ManageStores,
    /// Read invoices and subscription status.
    ViewBilling,
    /// Read the tenant audit log.
    ViewAuditLog,
    /// Edit tenant-wide settings.
    ManageSettings,
    /// Cancel the tenant's subscription. Owner-only.
    CancelSubscription,
}

impl Capability {
    /// All seven capabilities. The set is closed by design.
    pub const ALL: [Capability; 7] = [
        Capability::ManageBilling,
        Capability::ManageUsers,
        Capability::ManageStores,
        Capability::ViewBilling,
        Capability::ViewAuditLog,
        Capability::ManageSettings,
        Capability::CancelSubscription,
    ];

    /// Stable slug form, used in logs and audit entries.
    pub const fn slug(&self) -> &'static str {
        match self {
            Capability::ManageBilling => "billing:manage",
            Capability::ManageUsers => "users:manage",
            Capability::ManageStores => "stores:manage",
            Capability::ViewBilling => "billing:view",
            Capability::ViewAuditLog => "audit:view",
            Capability::ManageSettings => "settings:manage",
            Capability::CancelSubscription => "subscription:cancel",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

// =============================================================================
// PermissionSet
// =============================================================================

/// A complete mapping of the seven capabilities to booleans.
///
/// Every role maps to a complete set; there are no partial entries. Looking
/// up a capability never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub manage_billing: bool,
    pub manage_users: bool,
    pub manage_stores: bool,
    pub view_billing: bool,
    pub view_audit_log: bool,
    pub manage_settings: bool,
    pub cancel_subscription: bool,
}

impl PermissionSet {
    /// Every capability granted (Owner's set).
    pub const fn all() -> Self {
        PermissionSet {
            manage_billing: true,
            manage_users: true,
            manage_stores: true,
            view_billing: true,
            view_audit_log: true,
            manage_settings: true,
            cancel_subscription: true,
        }
    }

    /// Nothing granted (Viewer's set, and the fail-closed fallback).
    pub const fn none() -> Self {
        PermissionSet {
            manage_billing: false,
            manage_users: false,
            manage_stores: false,
            view_billing: false,
            view_audit_log: false,
            manage_settings: false,
            cancel_subscription: false,
        }
    }

    /// Returns a copy with one capability revoked.
    ///
    /// Used to derive narrower sets mechanically instead of hand-maintaining
    /// parallel tables.
    pub const fn without(mut self, capability: Capability) -> Self {
        match capability {
            Capability::ManageBilling => self.manage_billing = false,
            Capability::ManageUsers => self.manage_users = false,
            Capability::ManageStores => self.manage_stores = false,
            Capability::ViewBilling => self.view_billing = false,
            Capability::ViewAuditLog => self.view_audit_log = false,
            Capability::ManageSettings => self.manage_settings = false,
            Capability::CancelSubscription => self.cancel_subscription = false,
        }
        self
    }

    /// The static lookup table. Total over [`Role`]; never fails.
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Owner => PermissionSet::all(),
            // Derived, not hand-written: Owner minus subscription:cancel.
            Role::Admin => PermissionSet::all().without(Capability::CancelSubscription),
            // Tenant administration is owner/admin territory.
            Role::Staff => PermissionSet::none(),
            Role::Viewer => PermissionSet::none(),
        }
    }

    /// Capability check. Never panics.
    pub const fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageBilling => self.manage_billing,
            Capability::ManageUsers => self.manage_users,
            Capability::ManageStores => self.manage_stores,
            Capability::ViewBilling => self.view_billing,
            Capability::ViewAuditLog => self.view_audit_log,
            Capability::ManageSettings => self.manage_settings,
            Capability::CancelSubscription => self.cancel_subscription,
        }
    }

    /// True iff every capability granted by `other` is also granted here.
    pub fn is_superset_of(&self, other: &PermissionSet) -> bool {
        Capability::ALL
            .iter()
            .all(|cap| self.allows(*cap) || !other.allows(*cap))
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        PermissionSet::none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
