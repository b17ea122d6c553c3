//! Enrollment list, enrolling a student and withdrawing an enrollment.

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
use crate::actions::enrollment;
use crate::api::AppState;
use crate::context::RequestContext;
use crate::domain::{CreateEnrollmentRequest, Enrollment, WithdrawEnrollmentRequest};
use crate::error::ActionFailure;
use crate::rbac::permissions;

const ENROLLMENTS_PATH: &str = "/dashboard/enrollments";

#[derive(Debug, Default, Deserialize)]
pub struct EnrollmentsQuery {
    #[serde(rename = "schoolId")]
    pub school_id: Option<String>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrollmentForm {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub school_id: String,
    #[serde(default)]
    pub classroom_id: String,
    #[serde(default)]
    pub academic_year_id: String,
    #[serde(default)]
    pub enrollment_date: String,
}

impl EnrollmentForm {
    pub fn into_request(self) -> CreateEnrollmentRequest {
        CreateEnrollmentRequest {
            student_id: self.student_id.trim().to_string(),
            school_id: self.school_id.trim().to_string(),
            classroom_id: non_empty(&self.classroom_id),
            academic_year_id: non_empty(&self.academic_year_id),
            enrollment_date: non_empty(&self.enrollment_date),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WithdrawForm {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub withdrawal_date: String,
}

pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Query(query): Query<EnrollmentsQuery>,
) -> Response {
    let school_id = query.school_id.as_deref().and_then(non_empty);
    render_list(
        &state,
        &ctx,
        uri.path(),
        school_id.as_deref(),
        Notice::render(query.notice),
        None,
    )
    .await
}

pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Form(form): Form<EnrollmentForm>,
) -> Response {
    let request = form.into_request();
    match enrollment::create_enrollment_action(state.actions(&ctx), &request).await {
        Ok(_) => see_other(ENROLLMENTS_PATH, Notice::Created),
        Err(failure) => {
            render_list(&state, &ctx, uri.path(), None, String::new(), Some(failure)).await
        }
    }
}

pub async fn withdraw(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(enrollment_id): Path<String>,
    Form(form): Form<WithdrawForm>,
) -> Response {
    let request = WithdrawEnrollmentRequest::new(Some(form.reason), Some(form.withdrawal_date));
    match enrollment::withdraw_enrollment_action(state.actions(&ctx), &enrollment_id, &request).await {
        Ok(_) => see_other(ENROLLMENTS_PATH, Notice::Withdrawn),
        Err(failure) => {
            render_list(&state, &ctx, ENROLLMENTS_PATH, None, String::new(), Some(failure)).await
        }
    }
}

async fn render_list(
    state: &AppState,
    ctx: &RequestContext,
    path: &str,
    school_id: Option<&str>,
    notice: String,
    form_failure: Option<ActionFailure>,
) -> Response {
    let view = PageView::new(ctx, &state.gate, path, "Enrollments");
    let enrollments = match enrollment::get_enrollments_action(state.actions(ctx), school_id).await {
        Ok(rows) => rows,
        Err(failure) => return load_failure(&view, failure),
    };

    let mut body = format!("<h1>Enrollments</h1>{}", notice);
    if let Some(ref failure) = form_failure {
        body.push_str(&alert(failure));
    }
    let _ = write!(
        body,
        r#"<form method="get" action="{}"><label>School id <input name="schoolId" value="{}"></label> <button type="submit">Filter</button></form>"#,
        ENROLLMENTS_PATH,
        escape(school_id.unwrap_or_default()),
    );

    let can_withdraw = can(state, ctx, &permissions::ENROLLMENT_WITHDRAW);
    body.push_str(&enrollments_table(&enrollments, can_withdraw));

    if can(state, ctx, &permissions::ENROLLMENT_CREATE) {
        body.push_str(CREATE_ENROLLMENT_FORM);
    }

    let status = form_failure
        .as_ref()
        .map(form_failure_status)
        .unwrap_or_default();
    (status, Html(view.render(&body))).into_response()
}

const CREATE_ENROLLMENT_FORM: &str = r#"<form class="panel" method="post" action="/dashboard/enrollments"><h2>Enroll student</h2><label>Student id <input name="student_id" required></label><label>School id <input name="school_id" required></label><label>Classroom id <input name="classroom_id"></label><label>Academic year id <input name="academic_year_id"></label><label>Enrollment date <input name="enrollment_date" type="date"></label><button type="submit">Enroll</button></form>"#;

/// Active rows get a withdraw form when `can_withdraw` is set.
pub fn enrollments_table(rows: &[Enrollment], can_withdraw: bool) -> String {
    if rows.is_empty() {
        return "<p>No enrollments.</p>".to_string();
    }
    let mut html = String::from(
        "<table><thead><tr><th>Student</th><th>School</th><th>Classroom</th><th>Enrolled</th><th>Status</th><th></th></tr></thead><tbody>",
    );
    for e in rows {
        let student = e.student_name.as_deref().unwrap_or(&e.student_id);
        let withdraw = if can_withdraw && !e.is_withdrawn() {
            format!(
                r#"<form class="inline" method="post" action="/dashboard/enrollments/{}/withdraw"><input name="reason" placeholder="Reason"><input name="withdrawal_date" type="date"><button type="submit">Withdraw</button></form>"#,
                urlencoding::encode(&e.id)
            )
        } else {
            String::new()
        };
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            cell(Some(student)),
            cell(e.school_id.as_deref()),
            cell(e.classroom_id.as_deref()),
            cell(e.enrollment_date.as_deref()),
            cell(e.status.as_deref()),
            withdraw,
        );
    }
    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_withdraw_form_only_for_active() {
        let rows: Vec<Enrollment> = serde_json::from_value(json!([
            {"id": "e1", "studentId": "st-1", "studentName": "Grace Hopper", "status": "active"},
            {"id": "e2", "studentId": "st-2", "status": "withdrawn"}
        ]))
        .unwrap();

        let html = enrollments_table(&rows, true);
        assert!(html.contains("Grace Hopper"));
        assert!(html.contains("/dashboard/enrollments/e1/withdraw"));
        assert!(!html.contains("/dashboard/enrollments/e2/withdraw"));

        assert!(!enrollments_table(&rows, false).contains("<form"));
    }

    #[test]
    fn test_form_blank_optionals_dropped() {
        let request = EnrollmentForm {
            student_id: " st-1 ".to_string(),
            school_id: "s1".to_string(),
            classroom_id: "".to_string(),
            enrollment_date: "2024-09-01".to_string(),
            ..Default::default()
        }
        .into_request();
        assert_eq!(request.student_id, "st-1");
        assert_eq!(request.classroom_id, None);
        assert_eq!(request.enrollment_date.as_deref(), Some("2024-09-01"));
    }
}
