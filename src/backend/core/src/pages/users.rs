//! Tenant user administration.
//!
//! Listing and creating only. User detail and edit pages have no backend
//! support; [`unsupported`] answers them with a redirect to the list.

use std::fmt::Write;

use axum::{
    extract::{Query, State},
    http::{Method, Uri},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::info;

use super::{
    alert, can, cell, escape, form_failure_status, load_failure, non_empty, see_other, Notice,
    PageView,
};
use crate::actions::user;
use crate::api::AppState;
use crate::context::RequestContext;
use crate::domain::{CreateUserRequest, User};
use crate::error::ActionFailure;
use crate::rbac::{fallback_redirect, permissions, PredefinedRole};
use crate::telemetry::{RedirectReason, RouteMetrics};

pub const USERS_PATH: &str = "/dashboard/admin/users";

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub notice: Option<Notice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub school_id: String,
}

impl UserForm {
    pub fn into_request(self) -> CreateUserRequest {
        CreateUserRequest {
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            role: self.role.trim().to_string(),
            school_id: non_empty(&self.school_id),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Query(query): Query<UsersQuery>,
) -> Response {
    render_list(&state, &ctx, uri.path(), Notice::render(query.notice), None).await
}

pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Form(form): Form<UserForm>,
) -> Response {
    let request = form.into_request();
    match user::create_user_action(state.actions(&ctx), &request).await {
        Ok(_) => see_other(USERS_PATH, Notice::Created),
        Err(failure) => render_list(&state, &ctx, uri.path(), String::new(), Some(failure)).await,
    }
}

/// `/dashboard/admin/users/:id` and `/edit`.
pub async fn unsupported(ctx: RequestContext, method: Method, uri: Uri) -> Response {
    RouteMetrics::record_redirect(RedirectReason::Unsupported);
    info!(
        request_id = %ctx.request_id,
        path = %uri.path(),
        "User detail is not supported, redirecting to the list"
    );
    fallback_redirect(&method, USERS_PATH)
}

async fn render_list(
    state: &AppState,
    ctx: &RequestContext,
    path: &str,
    notice: String,
    form_failure: Option<ActionFailure>,
) -> Response {
    let view = PageView::new(ctx, &state.gate, path, "Users");
    let users = match user::get_users_action(state.actions(ctx)).await {
        Ok(users) => users,
        Err(failure) => return load_failure(&view, failure),
    };

    let mut body = format!("<h1>Users</h1>{}", notice);
    if let Some(ref failure) = form_failure {
        body.push_str(&alert(failure));
    }
    body.push_str(&users_table(&users));
    if can(state, ctx, &permissions::USER_CREATE) {
        body.push_str(&create_user_form());
    }

    let status = form_failure
        .as_ref()
        .map(form_failure_status)
        .unwrap_or_default();
    (status, Html(view.render(&body))).into_response()
}

fn create_user_form() -> String {
    let mut html = String::from(
        r#"<form class="panel" method="post" action="/dashboard/admin/users"><h2>Add user</h2><label>Email <input name="email" type="email" required></label><label>First name <input name="first_name" required></label><label>Last name <input name="last_name" required></label><label>Role <select name="role" required>"#,
    );
    for role in PredefinedRole::all() {
        let _ = write!(
            html,
            r#"<option value="{}">{}</option>"#,
            role.id(),
            escape(role.name())
        );
    }
    html.push_str(r#"</select></label><label>School id <input name="school_id"></label><button type="submit">Create user</button></form>"#);
    html
}

/// No detail links: the detail page does not exist.
pub fn users_table(users: &[User]) -> String {
    if users.is_empty() {
        return "<p>No users.</p>".to_string();
    }
    let mut html = String::from(
        "<table><thead><tr><th>Name</th><th>Email</th><th>Role</th><th>Status</th></tr></thead><tbody>",
    );
    for u in users {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&u.full_name()),
            escape(&u.email),
            cell(u.role.as_deref()),
            cell(u.status.as_deref()),
        );
    }
    html.push_str("</tbody></table>");
    html
}
