//! Server-rendered pages.
//!
//! Every page under `/dashboard` sits behind the page guard, which has
//! already checked the session, the route availability table and
//! [`required_permission`] by the time a handler runs. Handlers then call
//! actions and render. Action failures are shown inline through [`alert`];
//! only a missing session (redirect) and a backend denial (deny page) end the
//! page early.

pub mod academic;
pub mod auth;
pub mod availability;
pub mod charts;
pub mod dashboard;
pub mod enrollments;
pub mod layout;
pub mod schools;
pub mod theme;
pub mod users;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::context::RequestContext;
use crate::error::{ActionFailure, ErrorCode};
use crate::rbac::{permissions, sign_in_url, Permission};

pub use availability::{Availability, RouteAvailability, RoutePattern};
pub use layout::PageView;

// ═══════════════════════════════════════════════════════════════════════════════
// Routes
// ═══════════════════════════════════════════════════════════════════════════════

/// All `/dashboard` pages. The caller wraps them in the page guard.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::overview))
        .route(
            "/dashboard/schools",
            get(schools::list).post(schools::create),
        )
        .route(
            "/dashboard/schools/:school_id",
            get(schools::detail).post(schools::update),
        )
        .route(
            "/dashboard/schools/:school_id/departments",
            axum::routing::post(schools::create_department),
        )
        .route(
            "/dashboard/schools/:school_id/academic-years",
            axum::routing::post(schools::create_academic_year),
        )
        .route(
            "/dashboard/schools/:school_id/holidays",
            axum::routing::post(schools::create_holiday),
        )
        .route(
            "/dashboard/schools/:school_id/delete",
            axum::routing::post(schools::delete),
        )
        .route(
            "/dashboard/classrooms",
            get(academic::classrooms).post(academic::create_classroom),
        )
        .route(
            "/dashboard/classrooms/:classroom_id",
            get(academic::classroom_detail).post(academic::update_classroom),
        )
        .route(
            "/dashboard/classrooms/:classroom_id/delete",
            axum::routing::post(academic::delete_classroom),
        )
        .route(
            "/dashboard/classrooms/:classroom_id/assignments",
            axum::routing::post(academic::create_assignment),
        )
        .route(
            "/dashboard/classrooms/:classroom_id/attendance",
            axum::routing::post(academic::record_attendance),
        )
        .route(
            "/dashboard/grades",
            get(academic::grades).post(academic::record_grade),
        )
        .route(
            "/dashboard/enrollments",
            get(enrollments::list).post(enrollments::create),
        )
        .route(
            "/dashboard/enrollments/:enrollment_id/withdraw",
            axum::routing::post(enrollments::withdraw),
        )
        .route(
            "/dashboard/admin/users",
            get(users::list).post(users::create),
        )
        // Redirect stubs. The availability table normally answers first.
        .route(
            "/dashboard/admin/users/:user_id",
            get(users::unsupported).post(users::unsupported),
        )
        .route(
            "/dashboard/admin/users/:user_id/edit",
            get(users::unsupported).post(users::unsupported),
        )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Page Permissions
// ═══════════════════════════════════════════════════════════════════════════════

/// Route prefix to the permission needed to view it. Longest prefix wins.
const PAGE_PERMISSIONS: &[(&str, Permission)] = &[
    ("/dashboard/admin/users", permissions::USER_READ),
    ("/dashboard/schools", permissions::SCHOOL_READ),
    ("/dashboard/classrooms", permissions::CLASSROOM_READ),
    ("/dashboard/grades", permissions::GRADE_READ),
    ("/dashboard/enrollments", permissions::ENROLLMENT_READ),
];

/// Permission the page guard checks for `path`. Pages not listed need
/// `dashboard:view`.
pub fn required_permission(path: &str) -> Permission {
    PAGE_PERMISSIONS
        .iter()
        .filter(|(prefix, _)| {
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, permission)| permission.clone())
        .unwrap_or(permissions::DASHBOARD_VIEW)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Navigation
// ═══════════════════════════════════════════════════════════════════════════════

/// A sidebar entry, shown only to users holding `permission`.
#[derive(Debug, Clone)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub permission: Permission,
}

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem {
        label: "Overview",
        href: "/dashboard",
        permission: permissions::DASHBOARD_VIEW,
    },
    NavItem {
        label: "Schools",
        href: "/dashboard/schools",
        permission: permissions::SCHOOL_READ,
    },
    NavItem {
        label: "Classrooms",
        href: "/dashboard/classrooms",
        permission: permissions::CLASSROOM_READ,
    },
    NavItem {
        label: "Grades",
        href: "/dashboard/grades",
        permission: permissions::GRADE_READ,
    },
    NavItem {
        label: "Enrollments",
        href: "/dashboard/enrollments",
        permission: permissions::ENROLLMENT_READ,
    },
    NavItem {
        label: "Users",
        href: "/dashboard/admin/users",
        permission: permissions::USER_READ,
    },
];

// ═══════════════════════════════════════════════════════════════════════════════
// Rendering Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `None` and blank strings render as a dash.
pub(crate) fn cell(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => escape(v),
        None => "&ndash;".to_string(),
    }
}

/// Inline alert for a failed action.
pub fn alert(failure: &ActionFailure) -> String {
    let class = match failure.code {
        ErrorCode::ValidationFailed => "alert alert-warning",
        _ => "alert alert-error",
    };
    format!(
        r#"<div class="{}" role="alert">{}</div>"#,
        class,
        escape(&failure.message)
    )
}

/// Result notices carried through the post/redirect/get cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notice {
    Created,
    Deleted,
    Recorded,
    Withdrawn,
}

impl Notice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Recorded => "recorded",
            Self::Withdrawn => "withdrawn",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::Created => "Saved.",
            Self::Deleted => "Deleted.",
            Self::Recorded => "Recorded.",
            Self::Withdrawn => "Enrollment withdrawn.",
        }
    }

    pub fn render(notice: Option<Notice>) -> String {
        notice
            .map(|n| format!(r#"<div class="alert alert-success" role="status">{}</div>"#, n.message()))
            .unwrap_or_default()
    }
}

/// 303 back to `path` after a successful form post.
pub(crate) fn see_other(path: &str, notice: Notice) -> Response {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{}{}notice={}", path, separator, notice.as_str())).into_response()
}

/// Ends a page whose primary data could not be loaded.
///
/// A lost session goes back to sign-in, a backend denial gets the deny page,
/// and anything else renders the page shell with the alert.
pub(crate) fn load_failure(view: &PageView<'_>, failure: ActionFailure) -> Response {
    if failure.requires_sign_in() {
        return Redirect::to(&sign_in_url(view.path)).into_response();
    }
    if failure.is_forbidden() {
        return (
            StatusCode::FORBIDDEN,
            Html(layout::no_permission_page(view.ctx, &failure.message)),
        )
            .into_response();
    }

    let body = format!("<h1>{}</h1>{}", escape(view.title), alert(&failure));
    (failure.code.http_status(), Html(view.render(&body))).into_response()
}

/// Status for a page re-rendered with a failed form.
pub(crate) fn form_failure_status(failure: &ActionFailure) -> StatusCode {
    failure.code.http_status()
}

/// Trimmed, `None` when blank. Form fields arrive as strings.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A form number that failed to parse becomes a validation failure.
pub(crate) fn parse_number(field: &str, value: &str) -> Result<Option<f64>, ActionFailure> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) => v.parse::<f64>().map(Some).map_err(|_| ActionFailure {
            code: ErrorCode::ValidationFailed,
            message: format!("{} must be a number", field),
        }),
    }
}

/// Whether the form of `permission` should be shown to this caller.
pub(crate) fn can(state: &AppState, ctx: &RequestContext, permission: &Permission) -> bool {
    state.gate.has_permission(ctx.session(), permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_permission_longest_prefix() {
        assert_eq!(required_permission("/dashboard"), permissions::DASHBOARD_VIEW);
        assert_eq!(required_permission("/dashboard/schools"), permissions::SCHOOL_READ);
        assert_eq!(required_permission("/dashboard/schools/s1"), permissions::SCHOOL_READ);
        assert_eq!(required_permission("/dashboard/admin/users"), permissions::USER_READ);
        assert_eq!(required_permission("/dashboard/admin/users/7"), permissions::USER_READ);
        assert_eq!(required_permission("/dashboard/grades"), permissions::GRADE_READ);
        // Prefix must end on a segment boundary.
        assert_eq!(required_permission("/dashboard/schoolsx"), permissions::DASHBOARD_VIEW);
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_alert_escapes_message() {
        let html = alert(&ActionFailure {
            code: ErrorCode::ValidationFailed,
            message: "<b>Name</b> is required".to_string(),
        });
        assert!(html.contains("&lt;b&gt;Name"));
        assert!(html.contains("alert-warning"));
    }

    #[test]
    fn test_see_other_appends_notice() {
        let response = see_other("/dashboard/grades?assignmentId=a1", Notice::Recorded);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/dashboard/grades?assignmentId=a1&notice=recorded"
        );
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("Score", " 91.5 ").unwrap(), Some(91.5));
        assert_eq!(parse_number("Score", "").unwrap(), None);
        assert_eq!(
            parse_number("Score", "ninety").unwrap_err().message,
            "Score must be a number"
        );
    }
}
