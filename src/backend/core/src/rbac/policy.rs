//! Permission evaluators.
//!
//! An evaluator answers the question:
//! "May the user behind this session exercise permission P?"
//!
//! The gate never sees a missing session; that case is denied before an
//! evaluator is consulted.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use super::models::{Permission, Role, RoleId};
use super::roles::PredefinedRole;
use crate::session::Session;

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The action is allowed.
    Allow,
    /// The action is denied, with a reason.
    Deny(String),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Evaluators
// ═══════════════════════════════════════════════════════════════════════════════

/// Decides whether an authenticated session holds a permission.
pub trait PermissionEvaluator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn evaluate(&self, session: &Session, permission: &Permission) -> PolicyDecision;
}

/// Every authenticated user holds every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAuthenticated;

impl PermissionEvaluator for AllowAuthenticated {
    fn name(&self) -> &'static str {
        "allow_authenticated"
    }

    fn evaluate(&self, _session: &Session, _permission: &Permission) -> PolicyDecision {
        PolicyDecision::Allow
    }
}

/// Maps the session's role to a permission set.
///
/// Thread-safe via `DashMap`. Loaded with the predefined roles by default.
#[derive(Debug, Clone)]
pub struct RolePolicyEvaluator {
    /// Roles indexed by role id.
    roles: Arc<DashMap<RoleId, Role>>,
}

impl RolePolicyEvaluator {
    /// Create an evaluator without any roles.
    pub fn empty() -> Self {
        Self {
            roles: Arc::new(DashMap::new()),
        }
    }

    /// Create an evaluator loaded with the predefined roles.
    pub fn with_defaults() -> Self {
        let evaluator = Self::empty();
        evaluator.load_roles(PredefinedRole::all_defaults());
        evaluator
    }

    /// Register a role.
    pub fn add_role(&self, role: Role) {
        debug!(role_id = %role.id, "Adding role to policy evaluator");
        self.roles.insert(role.id.clone(), role);
    }

    /// Load multiple roles (e.g., predefined defaults).
    pub fn load_roles(&self, roles: Vec<Role>) {
        for role in roles {
            self.add_role(role);
        }
    }

    fn lookup(&self, role: &RoleId) -> Option<Role> {
        if let Some(found) = self.roles.get(role) {
            return Some(found.clone());
        }
        // Identity providers disagree on casing; retry with the canonical id.
        let canonical = PredefinedRole::from_role_id(role)?;
        self.roles
            .get(&RoleId::new(canonical.id()))
            .map(|r| r.clone())
    }
}

impl Default for RolePolicyEvaluator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PermissionEvaluator for RolePolicyEvaluator {
    fn name(&self) -> &'static str {
        "role_policy"
    }

    fn evaluate(&self, session: &Session, permission: &Permission) -> PolicyDecision {
        let Some(role) = self.lookup(&session.role) else {
            return PolicyDecision::Deny(format!("Unknown role {}", session.role));
        };

        if role.has_permission(permission) {
            debug!(
                user_id = %session.user_id,
                permission = %permission,
                role = %role.id,
                "Permission granted"
            );
            PolicyDecision::Allow
        } else {
            PolicyDecision::Deny(format!(
                "Role {} does not grant {}",
                role.id, permission
            ))
        }
    }
}
