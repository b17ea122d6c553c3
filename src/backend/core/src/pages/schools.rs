//! School pages: list, create, detail with departments, academic years and
//! holidays.

use std::fmt::Write;

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use super::{
    alert, can, cell, escape, form_failure_status, load_failure, non_empty, see_other, Notice,
    PageView,
};
use crate::actions::school;
use crate::api::AppState;
use crate::context::RequestContext;
use crate::domain::{
    AcademicYear, CreateAcademicYearRequest, CreateDepartmentRequest, CreateHolidayRequest,
    CreateSchoolRequest, Department, Holiday, School, UpdateSchoolRequest,
};
use crate::error::ActionFailure;
use crate::rbac::permissions;

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<Notice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchoolForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub principal_name: String,
    /// Edit form only.
    #[serde(default)]
    pub status: String,
}

impl SchoolForm {
    pub fn into_request(self) -> CreateSchoolRequest {
        CreateSchoolRequest {
            name: self.name.trim().to_string(),
            code: non_empty(&self.code),
            address: non_empty(&self.address),
            phone: non_empty(&self.phone),
            email: non_empty(&self.email),
            principal_name: non_empty(&self.principal_name),
        }
    }

    /// Blank fields are left as they are.
    pub fn into_update(self) -> UpdateSchoolRequest {
        UpdateSchoolRequest {
            name: non_empty(&self.name),
            code: non_empty(&self.code),
            address: non_empty(&self.address),
            phone: non_empty(&self.phone),
            email: non_empty(&self.email),
            principal_name: non_empty(&self.principal_name),
            status: non_empty(&self.status),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NamedForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub description: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// List
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Query(query): Query<NoticeQuery>,
) -> Response {
    render_list(&state, &ctx, uri.path(), Notice::render(query.notice), None)
        .await
}

pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Form(form): Form<SchoolForm>,
) -> Response {
    let request = form.into_request();
    match school::create_school_action(state.actions(&ctx), &request).await {
        Ok(_) => see_other(uri.path(), Notice::Created),
        Err(failure) => render_list(&state, &ctx, uri.path(), String::new(), Some(failure)).await,
    }
}

async fn render_list(
    state: &AppState,
    ctx: &RequestContext,
    path: &str,
    notice: String,
    form_failure: Option<ActionFailure>,
) -> Response {
    let view = PageView::new(ctx, &state.gate, path, "Schools");
    let schools = match school::get_schools_action(state.actions(ctx)).await {
        Ok(schools) => schools,
        Err(failure) => return load_failure(&view, failure),
    };

    let mut body = format!("<h1>Schools</h1>{}", notice);
    if let Some(ref failure) = form_failure {
        body.push_str(&alert(failure));
    }
    body.push_str(&schools_table(&schools));
    if can(state, ctx, &permissions::SCHOOL_CREATE) {
        body.push_str(CREATE_SCHOOL_FORM);
    }

    let status = form_failure
        .as_ref()
        .map(form_failure_status)
        .unwrap_or_default();
    (status, Html(view.render(&body))).into_response()
}

const CREATE_SCHOOL_FORM: &str = r#"<form class="panel" method="post" action="/dashboard/schools"><h2>Add school</h2><label>Name <input name="name" required></label><label>Code <input name="code"></label><label>Address <input name="address"></label><label>Phone <input name="phone"></label><label>Email <input name="email" type="email"></label><label>Principal <input name="principal_name"></label><button type="submit">Create school</button></form>"#;

pub fn schools_table(schools: &[School]) -> String {
    if schools.is_empty() {
        return "<p>No schools yet.</p>".to_string();
    }
    let mut html = String::from(
        "<table><thead><tr><th>Name</th><th>Code</th><th>Principal</th><th>Students</th><th>Status</th></tr></thead><tbody>",
    );
    for s in schools {
        let _ = write!(
            html,
            r#"<tr><td><a href="/dashboard/schools/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            urlencoding::encode(&s.id),
            escape(&s.name),
            cell(s.code.as_deref()),
            cell(s.principal_name.as_deref()),
            s.student_count.map(|n| n.to_string()).unwrap_or_else(|| "&ndash;".to_string()),
            cell(s.status.as_deref()),
        );
    }
    html.push_str("</tbody></table>");
    html
}

// ═══════════════════════════════════════════════════════════════════════════════
// Detail
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn detail(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Path(school_id): Path<String>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    render_detail(&state, &ctx, uri.path(), &school_id, Notice::render(query.notice), None).await
}

pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(school_id): Path<String>,
    Form(form): Form<SchoolForm>,
) -> Response {
    let request = form.into_update();
    let result = school::update_school_action(state.actions(&ctx), &school_id, &request).await;
    after_detail_post(&state, &ctx, &school_id, result.map(|_| ())).await
}

pub async fn create_department(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(school_id): Path<String>,
    Form(form): Form<NamedForm>,
) -> Response {
    let request = CreateDepartmentRequest {
        name: form.name.trim().to_string(),
        code: non_empty(&form.code),
        description: non_empty(&form.description),
    };
    let result = school::create_department_action(state.actions(&ctx), &school_id, &request).await;
    after_detail_post(&state, &ctx, &school_id, result.map(|_| ())).await
}

pub async fn create_academic_year(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(school_id): Path<String>,
    Form(form): Form<DateRangeForm>,
) -> Response {
    let request = CreateAcademicYearRequest {
        name: form.name.trim().to_string(),
        start_date: form.start_date.trim().to_string(),
        end_date: form.end_date.trim().to_string(),
        is_current: None,
    };
    let result =
        school::create_academic_year_action(state.actions(&ctx), &school_id, &request).await;
    after_detail_post(&state, &ctx, &school_id, result.map(|_| ())).await
}

pub async fn create_holiday(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(school_id): Path<String>,
    Form(form): Form<DateRangeForm>,
) -> Response {
    let request = CreateHolidayRequest {
        name: form.name.trim().to_string(),
        date: form.start_date.trim().to_string(),
        end_date: non_empty(&form.end_date),
        description: non_empty(&form.description),
    };
    let result = school::create_holiday_action(state.actions(&ctx), &school_id, &request).await;
    after_detail_post(&state, &ctx, &school_id, result.map(|_| ())).await
}

pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(school_id): Path<String>,
) -> Response {
    match school::delete_school_action(state.actions(&ctx), &school_id).await {
        Ok(()) => see_other("/dashboard/schools", Notice::Deleted),
        Err(failure) => {
            let path = detail_path(&school_id);
            render_detail(&state, &ctx, &path, &school_id, String::new(), Some(failure)).await
        }
    }
}

fn detail_path(school_id: &str) -> String {
    format!("/dashboard/schools/{}", urlencoding::encode(school_id))
}

async fn after_detail_post(
    state: &AppState,
    ctx: &RequestContext,
    school_id: &str,
    result: Result<(), ActionFailure>,
) -> Response {
    let path = detail_path(school_id);
    match result {
        Ok(()) => see_other(&path, Notice::Created),
        Err(failure) => render_detail(state, ctx, &path, school_id, String::new(), Some(failure)).await,
    }
}

async fn render_detail(
    state: &AppState,
    ctx: &RequestContext,
    path: &str,
    school_id: &str,
    notice: String,
    form_failure: Option<ActionFailure>,
) -> Response {
    let actions = state.actions(ctx);
    let view = PageView::new(ctx, &state.gate, path, "School");
    let school = match school::get_school_action(actions, school_id).await {
        Ok(school) => school,
        Err(failure) => return load_failure(&view, failure),
    };

    // Sections load one after another; a failing section shows its own alert.
    let departments = school::get_departments_action(actions, school_id).await;
    let years = school::get_academic_years_action(actions, school_id).await;
    let holidays = school::get_holidays_action(actions, school_id).await;

    let action_base = detail_path(school_id);
    let mut body = format!("<h1>{}</h1>{}", escape(&school.name), notice);
    if let Some(ref failure) = form_failure {
        body.push_str(&alert(failure));
    }
    let _ = write!(
        body,
        "<p>{} &middot; {} &middot; {}</p>",
        cell(school.code.as_deref()),
        cell(school.address.as_deref()),
        cell(school.email.as_deref()),
    );

    body.push_str("<h2>Departments</h2>");
    body.push_str(&section(departments, departments_table));
    if can(state, ctx, &permissions::DEPARTMENT_CREATE) {
        let _ = write!(
            body,
            r#"<form class="panel" method="post" action="{}/departments"><label>Name <input name="name" required></label><label>Code <input name="code"></label><label>Description <input name="description"></label><button type="submit">Add department</button></form>"#,
            action_base
        );
    }

    body.push_str("<h2>Academic years</h2>");
    body.push_str(&section(years, years_table));
    if can(state, ctx, &permissions::ACADEMIC_YEAR_CREATE) {
        let _ = write!(
            body,
            r#"<form class="panel" method="post" action="{}/academic-years"><label>Name <input name="name" placeholder="2024-2025" required></label><label>Starts <input name="start_date" type="date" required></label><label>Ends <input name="end_date" type="date" required></label><button type="submit">Add academic year</button></form>"#,
            action_base
        );
    }

    body.push_str("<h2>Holidays</h2>");
    body.push_str(&section(holidays, holidays_table));
    if can(state, ctx, &permissions::HOLIDAY_CREATE) {
        let _ = write!(
            body,
            r#"<form class="panel" method="post" action="{}/holidays"><label>Name <input name="name" required></label><label>Date <input name="start_date" type="date" required></label><label>Last day <input name="end_date" type="date"></label><label>Description <input name="description"></label><button type="submit">Add holiday</button></form>"#,
            action_base
        );
    }

    if can(state, ctx, &permissions::SCHOOL_UPDATE) {
        let _ = write!(
            body,
            r#"<form class="panel" method="post" action="{}"><h2>Edit school</h2><label>Name <input name="name" value="{}"></label><label>Address <input name="address" value="{}"></label><label>Phone <input name="phone" value="{}"></label><label>Email <input name="email" type="email" value="{}"></label><label>Principal <input name="principal_name" value="{}"></label><label>Status <select name="status"><option value=""></option><option value="active">active</option><option value="inactive">inactive</option></select></label><button type="submit">Save</button></form>"#,
            action_base,
            escape(&school.name),
            escape(school.address.as_deref().unwrap_or_default()),
            escape(school.phone.as_deref().unwrap_or_default()),
            escape(school.email.as_deref().unwrap_or_default()),
            escape(school.principal_name.as_deref().unwrap_or_default()),
        );
    }

    if can(state, ctx, &permissions::SCHOOL_DELETE) {
        let _ = write!(
            body,
            r#"<form class="inline" method="post" action="{}/delete"><button type="submit">Delete school</button></form>"#,
            action_base
        );
    }

    let status = form_failure
        .as_ref()
        .map(form_failure_status)
        .unwrap_or_default();
    (status, Html(view.render(&body))).into_response()
}

fn section<T>(result: Result<Vec<T>, ActionFailure>, table: fn(&[T]) -> String) -> String {
    match result {
        Ok(rows) => table(&rows),
        Err(failure) => alert(&failure),
    }
}

fn departments_table(rows: &[Department]) -> String {
    if rows.is_empty() {
        return "<p>No departments.</p>".to_string();
    }
    let mut html = String::from("<table><thead><tr><th>Name</th><th>Code</th><th>Head</th></tr></thead><tbody>");
    for d in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&d.name),
            cell(d.code.as_deref()),
            cell(d.head_of_department.as_deref()),
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn years_table(rows: &[AcademicYear]) -> String {
    if rows.is_empty() {
        return "<p>No academic years.</p>".to_string();
    }
    let mut html = String::from("<table><thead><tr><th>Name</th><th>Starts</th><th>Ends</th><th></th></tr></thead><tbody>");
    for y in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&y.name),
            cell(y.start_date.as_deref()),
            cell(y.end_date.as_deref()),
            if y.is_current == Some(true) { "Current" } else { "" },
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn holidays_table(rows: &[Holiday]) -> String {
    if rows.is_empty() {
        return "<p>No holidays.</p>".to_string();
    }
    let mut html = String::from("<table><thead><tr><th>Name</th><th>Date</th><th>Until</th></tr></thead><tbody>");
    for h in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&h.name),
            cell(h.date.as_deref()),
            cell(h.end_date.as_deref()),
        );
    }
    html.push_str("</tbody></table>");
    html
}
