//! RBAC data models: identifiers, Permission and Role.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identity provider subject of the signed-in user.
    UserId
);
string_id!(
    /// Tenant (school district) the session belongs to.
    TenantId
);
string_id!(
    /// Role name carried in the session, e.g. `school_admin`.
    RoleId
);

// ═══════════════════════════════════════════════════════════════════════════════
// Permission
// ═══════════════════════════════════════════════════════════════════════════════

/// A permission represents an action on a resource type.
///
/// Permissions follow the format `resource:action`, for example:
/// - `school:create`
/// - `enrollment:withdraw`
/// - `user:read`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// The resource type (e.g., "school", "classroom", "grade").
    pub resource: Cow<'static, str>,
    /// The action (e.g., "read", "create", "update", "delete").
    pub action: Cow<'static, str>,
}

impl Permission {
    /// Create a new permission.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: Cow::Owned(resource.into()),
            action: Cow::Owned(action.into()),
        }
    }

    /// Create a permission from static strings, usable in constants.
    pub const fn from_static(resource: &'static str, action: &'static str) -> Self {
        Self {
            resource: Cow::Borrowed(resource),
            action: Cow::Borrowed(action),
        }
    }

    /// Parse a permission from a colon-separated string like `"school:create"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (resource, action) = s.split_once(':')?;
        if resource.is_empty() || action.is_empty() {
            return None;
        }
        Some(Self::new(resource, action))
    }

    /// Check if this permission matches another, supporting wildcards.
    ///
    /// A wildcard `"*"` in either resource or action matches anything.
    pub fn matches(&self, other: &Permission) -> bool {
        let resource_match =
            self.resource == "*" || other.resource == "*" || self.resource == other.resource;
        let action_match =
            self.action == "*" || other.action == "*" || self.action == other.action;
        resource_match && action_match
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// Permissions checked by pages and actions.
pub mod permissions {
    use super::Permission;

    pub const DASHBOARD_VIEW: Permission = Permission::from_static("dashboard", "view");

    pub const SCHOOL_READ: Permission = Permission::from_static("school", "read");
    pub const SCHOOL_CREATE: Permission = Permission::from_static("school", "create");
    pub const SCHOOL_UPDATE: Permission = Permission::from_static("school", "update");
    pub const SCHOOL_DELETE: Permission = Permission::from_static("school", "delete");

    pub const DEPARTMENT_CREATE: Permission = Permission::from_static("department", "create");
    pub const ACADEMIC_YEAR_CREATE: Permission = Permission::from_static("academic_year", "create");
    pub const GRADING_PERIOD_CREATE: Permission =
        Permission::from_static("grading_period", "create");
    pub const HOLIDAY_CREATE: Permission = Permission::from_static("holiday", "create");

    pub const CLASSROOM_READ: Permission = Permission::from_static("classroom", "read");
    pub const CLASSROOM_CREATE: Permission = Permission::from_static("classroom", "create");
    pub const CLASSROOM_UPDATE: Permission = Permission::from_static("classroom", "update");
    pub const CLASSROOM_DELETE: Permission = Permission::from_static("classroom", "delete");

    pub const ASSIGNMENT_CREATE: Permission = Permission::from_static("assignment", "create");

    pub const GRADE_READ: Permission = Permission::from_static("grade", "read");
    pub const GRADE_RECORD: Permission = Permission::from_static("grade", "record");
    pub const GRADE_UPDATE: Permission = Permission::from_static("grade", "update");

    pub const ATTENDANCE_RECORD: Permission = Permission::from_static("attendance", "record");

    pub const ENROLLMENT_READ: Permission = Permission::from_static("enrollment", "read");
    pub const ENROLLMENT_CREATE: Permission = Permission::from_static("enrollment", "create");
    pub const ENROLLMENT_WITHDRAW: Permission = Permission::from_static("enrollment", "withdraw");

    pub const USER_READ: Permission = Permission::from_static("user", "read");
    pub const USER_CREATE: Permission = Permission::from_static("user", "create");
}

// ═══════════════════════════════════════════════════════════════════════════════
// Role
// ═══════════════════════════════════════════════════════════════════════════════

/// A role groups a set of permissions under a named identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique role identifier.
    pub id: RoleId,
    /// Human-readable name.
    pub name: String,
    /// Description of the role's purpose.
    pub description: String,
    /// Set of permissions granted by this role.
    pub permissions: HashSet<Permission>,
}

impl Role {
    /// Create a new role with the given permissions.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: HashSet<Permission>,
    ) -> Self {
        Self {
            id: RoleId::new(id),
            name: name.into(),
            description: description.into(),
            permissions,
        }
    }

    /// Check if this role grants a specific permission.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.iter().any(|p| p.matches(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_parse() {
        let perm = Permission::parse("school:create").unwrap();
        assert_eq!(perm, permissions::SCHOOL_CREATE);
        assert!(Permission::parse("school").is_none());
        assert!(Permission::parse(":create").is_none());
    }

    #[test]
    fn test_permission_wildcard() {
        let all_school = Permission::new("school", "*");
        assert!(all_school.matches(&permissions::SCHOOL_DELETE));
        assert!(!all_school.matches(&permissions::CLASSROOM_READ));
        assert!(Permission::new("*", "*").matches(&permissions::USER_CREATE));
    }

    #[test]
    fn test_permission_display() {
        assert_eq!(permissions::ENROLLMENT_WITHDRAW.to_string(), "enrollment:withdraw");
    }

    #[test]
    fn test_role_has_permission() {
        let mut perms = HashSet::new();
        perms.insert(permissions::SCHOOL_READ);
        let role = Role::new("viewer", "Viewer", "Read schools", perms);
        assert!(role.has_permission(&permissions::SCHOOL_READ));
        assert!(!role.has_permission(&permissions::SCHOOL_CREATE));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&TenantId::new("t-1")).unwrap();
        assert_eq!(json, "\"t-1\"");
    }
}
