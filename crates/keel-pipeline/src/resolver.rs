//! # Permission Resolver
//!
//! Determines the caller's role within the active tenant and answers the
//! capability questions that gate admin actions.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Role Resolution Flow                               │
//! │                                                                         │
//! │  resolve(tenant, user)                                                  │
//! │        │                                                                │
//! │        ├── tenant or user absent ────────────►  Viewer (Resolved)       │
//! │        │                                                                │
//! │        ├── tenant identity changed ──────────►  enter Resolving         │
//! │        │         │                               (role = Viewer)        │
//! │        │         ▼                                                      │
//! │        │   RoleLookup::role_for(tenant, user)                           │
//! │        │         │                                                      │
//! │        │         ├── Ok(role) ───────────────►  role (Resolved)         │
//! │        │         └── Err(e)   ── logged ─────►  Viewer (Resolved)       │
//! │        │                                                                │
//! │  FAIL CLOSED: no path out of resolve() ever grants more than the        │
//! │  lookup proved. Errors never propagate to the caller.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The role policy itself lives behind the [`RoleLookup`] trait. The shipped
//! [`CreatorHeuristic`] (tenant creator → Owner, everyone else → Admin) is a
//! stand-in until a per-user role endpoint exists; hosts with a real lookup
//! inject their own implementation.

use async_trait::async_trait;
use keel_core::permission::{Capability, PermissionSet};
use keel_core::role::{Role, RoleResolution};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::error::LookupError;

// =============================================================================
// Context Types
// =============================================================================

/// The only tenant fields the resolver reads. Everything else about a tenant
/// is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    /// Tenant identifier. Changing it re-enters resolution.
    pub id: String,
    /// Identifier of the user who created the tenant (email in the current
    /// data model).
    pub created_by: String,
}

/// The only user fields the resolver reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

// =============================================================================
// Role Lookup Seam
// =============================================================================

/// Pluggable role policy.
///
/// Implementations may call out to a role endpoint; the resolver treats any
/// error as "could not prove a role" and falls back to `Viewer`.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn role_for(
        &self,
        tenant: &TenantContext,
        user: &CurrentUser,
    ) -> Result<Role, LookupError>;
}

/// Placeholder policy: tenant creator is `Owner`, any other authenticated
/// user is `Admin`.
///
/// This is a stand-in pending a real per-user role endpoint. It is kept as
/// its own named type (rather than buried in the resolver) so the policy is
/// explicit and replaceable.
pub struct CreatorHeuristic;

#[async_trait]
impl RoleLookup for CreatorHeuristic {
    async fn role_for(
        &self,
        tenant: &TenantContext,
        user: &CurrentUser,
    ) -> Result<Role, LookupError> {
        if tenant.created_by.is_empty() {
            return Err(LookupError::MalformedTenant(
                "created_by is empty".to_string(),
            ));
        }
        if user.email.is_empty() {
            return Err(LookupError::MalformedUser("email is empty".to_string()));
        }
        if tenant.created_by == user.email {
            Ok(Role::Owner)
        } else {
            Ok(Role::Admin)
        }
    }
}

// =============================================================================
// Permission Resolver
// =============================================================================

struct ResolverInner {
    resolution: RoleResolution,
    /// Tenant identity the current resolution belongs to.
    tenant_id: Option<String>,
}

/// Resolves the caller's role for the active tenant and answers capability
/// checks from whatever state is currently held.
///
/// `can` and `has_dashboard_access` never block and never panic: they give a
/// best-effort answer from the last completed (or in-flight) resolution.
pub struct PermissionResolver {
    lookup: Arc<dyn RoleLookup>,
    inner: RwLock<ResolverInner>,
}

impl PermissionResolver {
    /// Resolver with the shipped creator-heuristic policy.
    pub fn new() -> Self {
        Self::with_lookup(Arc::new(CreatorHeuristic))
    }

    /// Resolver with an injected role policy.
    pub fn with_lookup(lookup: Arc<dyn RoleLookup>) -> Self {
        PermissionResolver {
            lookup,
            inner: RwLock::new(ResolverInner {
                resolution: RoleResolution::resolving(),
                tenant_id: None,
            }),
        }
    }

    /// Resolves the role for the given tenant/user pair.
    ///
    /// Absent tenant or user resolves to `Viewer` immediately. A changed
    /// tenant identity re-enters `Resolving` (with role `Viewer`) before the
    /// lookup runs, so a slow lookup never leaves stale elevated access
    /// visible. Lookup failures are logged and degrade to `Viewer`; they
    /// never propagate.
    pub async fn resolve(
        &self,
        tenant: Option<&TenantContext>,
        user: Option<&CurrentUser>,
    ) -> RoleResolution {
        let (tenant, user) = match (tenant, user) {
            (Some(tenant), Some(user)) => (tenant, user),
            _ => {
                debug!("no tenant or user in scope, resolving to viewer");
                let resolution = RoleResolution::resolved(Role::Viewer);
                let mut inner = self.write();
                inner.resolution = resolution;
                inner.tenant_id = None;
                return resolution;
            }
        };

        {
            let mut inner = self.write();
            if inner.tenant_id.as_deref() != Some(tenant.id.as_str()) {
                inner.resolution = RoleResolution::resolving();
                inner.tenant_id = Some(tenant.id.clone());
            }
        }

        let role = match self.lookup.role_for(tenant, user).await {
            Ok(role) => role,
            Err(err) => {
                warn!(
                    tenant = %tenant.id,
                    error = %err,
                    "role lookup failed, falling back to viewer"
                );
                Role::Viewer
            }
        };

        let resolution = RoleResolution::resolved(role);
        let mut inner = self.write();
        // A concurrent resolve for a different tenant wins; don't clobber it.
        if inner.tenant_id.as_deref() == Some(tenant.id.as_str()) {
            inner.resolution = resolution;
        }
        resolution
    }

    /// Capability check against the current resolution. Never panics; an
    /// in-flight resolution answers as `Viewer` (all false).
    pub fn can(&self, capability: Capability) -> bool {
        PermissionSet::for_role(self.read().resolution.role).allows(capability)
    }

    /// True iff the current role is `Owner` or `Admin`.
    pub fn has_dashboard_access(&self) -> bool {
        self.read().resolution.role.has_dashboard_access()
    }

    /// The current resolution state.
    pub fn resolution(&self) -> RoleResolution {
        self.read().resolution
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ResolverInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ResolverInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PermissionResolver {
    fn default() -> Self {
        PermissionResolver::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
