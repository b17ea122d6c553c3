//! Role-based access control.
//!
//! This module provides:
//! - **Models**: Permission, Role and the identifier types carried in a session
//! - **Evaluators**: the [`PermissionEvaluator`] trait with the
//!   `allow_authenticated` and `role_policy` implementations
//! - **Predefined Roles**: tenant admin, school admin, teacher, student, parent
//! - **Gate**: [`RbacGate`], the single decision point, selected by configuration
//! - **Page Guard**: tower middleware applying sign-in, availability and RBAC checks
//!
//! # Usage
//!
//! ```rust,ignore
//! use edforge_core::rbac::{permissions, RbacGate};
//!
//! let gate = RbacGate::from_config(&config.rbac);
//! if gate.has_permission(ctx.session(), &permissions::SCHOOL_CREATE) {
//!     // show the create form
//! }
//! ```

pub mod gate;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod roles;

pub use gate::RbacGate;
pub use middleware::{
    fallback_redirect, sign_in_url, PageGuardLayer, PageGuardService, PermissionResolver,
};
pub use models::{permissions, Permission, Role, RoleId, TenantId, UserId};
pub use policy::{AllowAuthenticated, PermissionEvaluator, PolicyDecision, RolePolicyEvaluator};
pub use roles::PredefinedRole;
