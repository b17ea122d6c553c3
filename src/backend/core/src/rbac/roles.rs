//! Predefined roles with default permission sets.
//!
//! These back the `role_policy` evaluator. The identity provider puts one of
//! the role ids below into the session token:
//!
//! | Role          | Description                                                   |
//! |---------------|---------------------------------------------------------------|
//! | tenant_admin  | Everything within the tenant, including user management       |
//! | school_admin  | Schools, calendars, classrooms and enrollments                |
//! | teacher       | Classrooms, assignments, grades and attendance                |
//! | student       | Read-only view of schools, classrooms and own grades          |
//! | parent        | Read-only view of schools, grades and enrollments             |

use std::collections::HashSet;

use super::models::{permissions::*, Permission, Role, RoleId};

/// Predefined role templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredefinedRole {
    TenantAdmin,
    SchoolAdmin,
    Teacher,
    Student,
    Parent,
}

impl PredefinedRole {
    /// Get the role identifier string.
    pub fn id(&self) -> &'static str {
        match self {
            Self::TenantAdmin => "tenant_admin",
            Self::SchoolAdmin => "school_admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Parent => "parent",
        }
    }

    /// Get the human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TenantAdmin => "Tenant Admin",
            Self::SchoolAdmin => "School Admin",
            Self::Teacher => "Teacher",
            Self::Student => "Student",
            Self::Parent => "Parent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::TenantAdmin => "Full access to every resource in the tenant",
            Self::SchoolAdmin => "Manage schools, calendars, classrooms and enrollments",
            Self::Teacher => "Manage classrooms, assignments, grades and attendance",
            Self::Student => "Read-only access to schools, classrooms and grades",
            Self::Parent => "Read-only access to schools, grades and enrollments",
        }
    }

    /// Return the set of permissions for this predefined role.
    pub fn permissions(&self) -> HashSet<Permission> {
        let perms: &[Permission] = match self {
            // Wildcard: all resources, all actions.
            Self::TenantAdmin => return HashSet::from([Permission::from_static("*", "*")]),
            Self::SchoolAdmin => &[
                DASHBOARD_VIEW,
                SCHOOL_READ,
                SCHOOL_CREATE,
                SCHOOL_UPDATE,
                SCHOOL_DELETE,
                DEPARTMENT_CREATE,
                ACADEMIC_YEAR_CREATE,
                GRADING_PERIOD_CREATE,
                HOLIDAY_CREATE,
                CLASSROOM_READ,
                CLASSROOM_CREATE,
                CLASSROOM_UPDATE,
                CLASSROOM_DELETE,
                ASSIGNMENT_CREATE,
                GRADE_READ,
                ENROLLMENT_READ,
                ENROLLMENT_CREATE,
                ENROLLMENT_WITHDRAW,
                USER_READ,
            ],
            Self::Teacher => &[
                DASHBOARD_VIEW,
                SCHOOL_READ,
                CLASSROOM_READ,
                CLASSROOM_UPDATE,
                ASSIGNMENT_CREATE,
                GRADE_READ,
                GRADE_RECORD,
                GRADE_UPDATE,
                ATTENDANCE_RECORD,
                ENROLLMENT_READ,
            ],
            Self::Student => &[DASHBOARD_VIEW, SCHOOL_READ, CLASSROOM_READ, GRADE_READ],
            Self::Parent => &[DASHBOARD_VIEW, SCHOOL_READ, GRADE_READ, ENROLLMENT_READ],
        };
        perms.iter().cloned().collect()
    }

    /// Build a full `Role` struct from this predefined role.
    pub fn to_role(&self) -> Role {
        Role::new(self.id(), self.name(), self.description(), self.permissions())
    }

    /// Resolve a role id as issued by the identity provider.
    ///
    /// Matching ignores case and treats `-` and spaces like `_`, so
    /// `School-Admin` and `SCHOOL_ADMIN` both resolve.
    pub fn from_role_id(role: &RoleId) -> Option<Self> {
        let normalized: String = role
            .as_str()
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        Self::all().into_iter().find(|r| r.id() == normalized)
    }

    /// Return all predefined roles.
    pub fn all() -> Vec<PredefinedRole> {
        vec![
            Self::TenantAdmin,
            Self::SchoolAdmin,
            Self::Teacher,
            Self::Student,
            Self::Parent,
        ]
    }

    /// Return all predefined roles as `Role` structs.
    pub fn all_defaults() -> Vec<Role> {
        Self::all().into_iter().map(|r| r.to_role()).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_admin_has_wildcard() {
        let role = PredefinedRole::TenantAdmin.to_role();
        assert!(role.has_permission(&SCHOOL_CREATE));
        assert!(role.has_permission(&USER_CREATE));
        assert!(role.has_permission(&Permission::new("anything", "anything")));
    }

    #[test]
    fn test_school_admin_permissions() {
        let role = PredefinedRole::SchoolAdmin.to_role();
        assert!(role.has_permission(&SCHOOL_CREATE));
        assert!(role.has_permission(&ENROLLMENT_WITHDRAW));
        assert!(role.has_permission(&USER_READ));
        assert!(!role.has_permission(&USER_CREATE));
        assert!(!role.has_permission(&GRADE_RECORD));
    }

    #[test]
    fn test_teacher_permissions() {
        let role = PredefinedRole::Teacher.to_role();
        assert!(role.has_permission(&GRADE_RECORD));
        assert!(role.has_permission(&ATTENDANCE_RECORD));
        assert!(!role.has_permission(&SCHOOL_CREATE));
        assert!(!role.has_permission(&ENROLLMENT_CREATE));
    }

    #[test]
    fn test_student_is_read_only() {
        let role = PredefinedRole::Student.to_role();
        for perm in role.permissions.iter() {
            assert!(
                perm.action == "read" || perm.action == "view",
                "student holds mutating permission {}",
                perm
            );
        }
    }

    #[test]
    fn test_from_role_id_normalizes() {
        assert_eq!(
            PredefinedRole::from_role_id(&RoleId::new("School-Admin")),
            Some(PredefinedRole::SchoolAdmin)
        );
        assert_eq!(
            PredefinedRole::from_role_id(&RoleId::new("TEACHER")),
            Some(PredefinedRole::Teacher)
        );
        assert_eq!(PredefinedRole::from_role_id(&RoleId::new("janitor")), None);
    }

    #[test]
    fn test_all_defaults() {
        let roles = PredefinedRole::all_defaults();
        assert_eq!(roles.len(), 5);
        assert!(roles.iter().any(|r| r.id.as_str() == "parent"));
    }
}
