//! Classroom, assignment, attendance and grade pages.

use std::fmt::Write;

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use super::{
    alert, can, cell, escape, form_failure_status, load_failure, non_empty, parse_number,
    see_other, Notice, PageView,
};
use crate::actions::{academic, enrollment, school};
use crate::api::AppState;
use crate::context::RequestContext;
use crate::domain::{
    Assignment, Attendance, AttendanceEntry, AttendanceStatus, Classroom, CreateAssignmentRequest,
    CreateClassroomRequest, Grade, RecordAttendanceRequest, RecordGradeRequest,
    UpdateClassroomRequest, UpdateGradeRequest,
};
use crate::error::{ActionFailure, ErrorCode};
use crate::rbac::permissions;

/// Form field prefix for per-student attendance selects.
const STATUS_FIELD_PREFIX: &str = "status:";

fn invalid(message: impl Into<String>) -> ActionFailure {
    ActionFailure {
        code: ErrorCode::ValidationFailed,
        message: message.into(),
    }
}

fn parse_capacity(value: &str) -> Result<Option<u32>, ActionFailure> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) => v
            .parse::<u32>()
            .map(Some)
            .map_err(|_| invalid("Capacity must be a whole number")),
    }
}

fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Classrooms
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct ClassroomsQuery {
    #[serde(rename = "schoolId")]
    pub school_id: Option<String>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassroomForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub school_id: String,
    #[serde(default)]
    pub grade_level: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub teacher_id: String,
    #[serde(default)]
    pub capacity: String,
}

impl ClassroomForm {
    pub fn into_create(self) -> Result<CreateClassroomRequest, ActionFailure> {
        Ok(CreateClassroomRequest {
            capacity: parse_capacity(&self.capacity)?,
            name: self.name.trim().to_string(),
            school_id: self.school_id.trim().to_string(),
            grade_level: non_empty(&self.grade_level),
            subject: non_empty(&self.subject),
            teacher_id: non_empty(&self.teacher_id),
        })
    }

    /// Blank fields are left as they are.
    pub fn into_update(self) -> Result<UpdateClassroomRequest, ActionFailure> {
        Ok(UpdateClassroomRequest {
            capacity: parse_capacity(&self.capacity)?,
            name: non_empty(&self.name),
            grade_level: non_empty(&self.grade_level),
            subject: non_empty(&self.subject),
            teacher_id: non_empty(&self.teacher_id),
        })
    }
}

pub async fn classrooms(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Query(query): Query<ClassroomsQuery>,
) -> Response {
    let school_id = query.school_id.as_deref().and_then(|s| non_empty(s));
    render_classrooms(&state, &ctx, uri.path(), school_id.as_deref(), Notice::render(query.notice), None)
        .await
}

pub async fn create_classroom(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Form(form): Form<ClassroomForm>,
) -> Response {
    let result = match form.into_create() {
        Ok(request) => academic::create_classroom_action(state.actions(&ctx), &request)
            .await
            .map(|_| ()),
        Err(failure) => Err(failure),
    };
    match result {
        Ok(()) => see_other(uri.path(), Notice::Created),
        Err(failure) => {
            render_classrooms(&state, &ctx, uri.path(), None, String::new(), Some(failure)).await
        }
    }
}

async fn render_classrooms(
    state: &AppState,
    ctx: &RequestContext,
    path: &str,
    school_id: Option<&str>,
    notice: String,
    form_failure: Option<ActionFailure>,
) -> Response {
    let actions = state.actions(ctx);
    let view = PageView::new(ctx, &state.gate, path, "Classrooms");
    let classrooms = match academic::get_classrooms_action(actions, school_id).await {
        Ok(rows) => rows,
        Err(failure) => return load_failure(&view, failure),
    };

    let mut body = format!("<h1>Classrooms</h1>{}", notice);
    if let Some(ref failure) = form_failure {
        body.push_str(&alert(failure));
    }
    body.push_str(&classrooms_table(&classrooms));

    if can(state, ctx, &permissions::CLASSROOM_CREATE) {
        // School picker, when the schools can be listed.
        let schools = if can(state, ctx, &permissions::SCHOOL_READ) {
            school::get_schools_action(actions).await.unwrap_or_default()
        } else {
            Vec::new()
        };
        let school_field = match schools {
            schools if !schools.is_empty() => {
                let mut select = String::from(r#"<select name="school_id" required>"#);
                for s in &schools {
                    let selected = if Some(s.id.as_str()) == school_id { " selected" } else { "" };
                    let _ = write!(
                        select,
                        r#"<option value="{}"{}>{}</option>"#,
                        escape(&s.id),
                        selected,
                        escape(&s.name)
                    );
                }
                select.push_str("</select>");
                select
            }
            _ => r#"<input name="school_id" required>"#.to_string(),
        };
        let _ = write!(
            body,
            r#"<form class="panel" method="post" action="/dashboard/classrooms"><h2>Add classroom</h2><label>Name <input name="name" required></label><label>School {}</label><label>Grade level <input name="grade_level"></label><label>Subject <input name="subject"></label><label>Teacher id <input name="teacher_id"></label><label>Capacity <input name="capacity" inputmode="numeric"></label><button type="submit">Create classroom</button></form>"#,
            school_field
        );
    }

    let status = form_failure.as_ref().map(form_failure_status).unwrap_or_default();
    (status, Html(view.render(&body))).into_response()
}

pub fn classrooms_table(rows: &[Classroom]) -> String {
    if rows.is_empty() {
        return "<p>No classrooms.</p>".to_string();
    }
    let mut html = String::from(
        "<table><thead><tr><th>Name</th><th>Grade</th><th>Subject</th><th>Capacity</th></tr></thead><tbody>",
    );
    for c in rows {
        let _ = write!(
            html,
            r#"<tr><td><a href="/dashboard/classrooms/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            urlencoding::encode(&c.id),
            escape(&c.name),
            cell(c.grade_level.as_deref()),
            cell(c.subject.as_deref()),
            c.capacity.map(|n| n.to_string()).unwrap_or_else(|| "&ndash;".to_string()),
        );
    }
    html.push_str("</tbody></table>");
    html
}

// ═══════════════════════════════════════════════════════════════════════════════
// Classroom detail
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub date: Option<String>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub max_score: String,
}

impl AssignmentForm {
    pub fn into_request(self) -> Result<CreateAssignmentRequest, ActionFailure> {
        Ok(CreateAssignmentRequest {
            max_score: parse_number("Max score", &self.max_score)?,
            title: self.title.trim().to_string(),
            description: non_empty(&self.description),
            due_date: non_empty(&self.due_date),
        })
    }
}

fn classroom_path(classroom_id: &str) -> String {
    format!("/dashboard/classrooms/{}", urlencoding::encode(classroom_id))
}

pub async fn classroom_detail(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Path(classroom_id): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Response {
    let date = query.date.as_deref().and_then(non_empty).unwrap_or_else(today);
    render_detail(
        &state,
        &ctx,
        uri.path(),
        &classroom_id,
        &date,
        Notice::render(query.notice),
        None,
    )
    .await
}

pub async fn update_classroom(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(classroom_id): Path<String>,
    Form(form): Form<ClassroomForm>,
) -> Response {
    let result = match form.into_update() {
        Ok(request) => academic::update_classroom_action(state.actions(&ctx), &classroom_id, &request)
            .await
            .map(|_| ()),
        Err(failure) => Err(failure),
    };
    after_detail_post(&state, &ctx, &classroom_id, &today(), result, Notice::Created).await
}

pub async fn delete_classroom(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(classroom_id): Path<String>,
) -> Response {
    match academic::delete_classroom_action(state.actions(&ctx), &classroom_id).await {
        Ok(()) => see_other("/dashboard/classrooms", Notice::Deleted),
        Err(failure) => {
            let path = classroom_path(&classroom_id);
            render_detail(&state, &ctx, &path, &classroom_id, &today(), String::new(), Some(failure))
                .await
        }
    }
}

pub async fn create_assignment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(classroom_id): Path<String>,
    Form(form): Form<AssignmentForm>,
) -> Response {
    let result = match form.into_request() {
        Ok(request) => {
            academic::create_assignment_action(state.actions(&ctx), &classroom_id, &request)
                .await
                .map(|_| ())
        }
        Err(failure) => Err(failure),
    };
    after_detail_post(&state, &ctx, &classroom_id, &today(), result, Notice::Created).await
}

/// Parse a roll-call form: `date`, then one `status:<student id>` field per
/// student, plus an optional `new_student_id`/`new_status` pair.
pub fn parse_attendance_form(fields: &[(String, String)]) -> Result<RecordAttendanceRequest, ActionFailure> {
    let mut date = String::new();
    let mut records = Vec::new();
    let mut new_student = None;
    let mut new_status = None;

    for (key, value) in fields {
        if key == "date" {
            date = value.trim().to_string();
        } else if key == "new_student_id" {
            new_student = non_empty(value);
        } else if key == "new_status" {
            new_status = non_empty(value);
        } else if let Some(student_id) = key.strip_prefix(STATUS_FIELD_PREFIX) {
            // Blank select means "not taken".
            let Some(value) = non_empty(value) else { continue };
            let status = AttendanceStatus::parse(&value)
                .ok_or_else(|| invalid(format!("Unknown attendance status '{}'", value)))?;
            records.push(AttendanceEntry {
                student_id: student_id.to_string(),
                status,
                notes: None,
            });
        }
    }

    if let Some(student_id) = new_student {
        let value = new_status.unwrap_or_else(|| AttendanceStatus::Present.as_str().to_string());
        let status = AttendanceStatus::parse(&value)
            .ok_or_else(|| invalid(format!("Unknown attendance status '{}'", value)))?;
        records.push(AttendanceEntry {
            student_id,
            status,
            notes: None,
        });
    }

    Ok(RecordAttendanceRequest { date, records })
}

pub async fn record_attendance(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(classroom_id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let request = parse_attendance_form(&fields);
    let date = request
        .as_ref()
        .ok()
        .and_then(|r| non_empty(&r.date))
        .unwrap_or_else(today);
    let result = match request {
        Ok(request) => academic::record_attendance_action(state.actions(&ctx), &classroom_id, &request)
            .await
            .map(|_| ()),
        Err(failure) => Err(failure),
    };
    after_detail_post(&state, &ctx, &classroom_id, &date, result, Notice::Recorded).await
}

async fn after_detail_post(
    state: &AppState,
    ctx: &RequestContext,
    classroom_id: &str,
    date: &str,
    result: Result<(), ActionFailure>,
    notice: Notice,
) -> Response {
    let path = classroom_path(classroom_id);
    match result {
        Ok(()) => see_other(&format!("{}?date={}", path, urlencoding::encode(date)), notice),
        Err(failure) => {
            render_detail(state, ctx, &path, classroom_id, date, String::new(), Some(failure)).await
        }
    }
}

async fn render_detail(
    state: &AppState,
    ctx: &RequestContext,
    path: &str,
    classroom_id: &str,
    date: &str,
    notice: String,
    form_failure: Option<ActionFailure>,
) -> Response {
    let actions = state.actions(ctx);
    let view = PageView::new(ctx, &state.gate, path, "Classroom");
    let classroom = match academic::get_classroom_action(actions, classroom_id).await {
        Ok(classroom) => classroom,
        Err(failure) => return load_failure(&view, failure),
    };
    let assignments = academic::get_assignments_action(actions, classroom_id).await;
    let attendance = academic::get_attendance_action(actions, classroom_id, Some(date)).await;

    let base = classroom_path(classroom_id);
    let mut body = format!("<h1>{}</h1>{}", escape(&classroom.name), notice);
    if let Some(ref failure) = form_failure {
        body.push_str(&alert(failure));
    }
    let _ = write!(
        body,
        "<p>Grade {} &middot; {} &middot; capacity {}</p>",
        cell(classroom.grade_level.as_deref()),
        cell(classroom.subject.as_deref()),
        classroom.capacity.map(|n| n.to_string()).unwrap_or_else(|| "&ndash;".to_string()),
    );

    body.push_str("<h2>Assignments</h2>");
    match assignments {
        Ok(rows) => body.push_str(&assignments_table(&rows)),
        Err(failure) => body.push_str(&alert(&failure)),
    }
    if can(state, ctx, &permissions::ASSIGNMENT_CREATE) {
        let _ = write!(
            body,
            r#"<form class="panel" method="post" action="{}/assignments"><label>Title <input name="title" required></label><label>Description <input name="description"></label><label>Due <input name="due_date" type="date"></label><label>Max score <input name="max_score" inputmode="decimal"></label><button type="submit">Add assignment</button></form>"#,
            base
        );
    }

    let _ = write!(
        body,
        r#"<h2>Attendance</h2><form method="get" action="{}"><label>Date <input name="date" type="date" value="{}"></label> <button type="submit">Show</button></form>"#,
        base,
        escape(date)
    );
    let rows = match attendance {
        Ok(rows) => rows,
        Err(failure) => {
            body.push_str(&alert(&failure));
            Vec::new()
        }
    };
    body.push_str(&attendance_table(&rows));

    if can(state, ctx, &permissions::ATTENDANCE_RECORD) {
        let roster = roster(state, ctx, &classroom, &rows).await;
        body.push_str(&attendance_form(&base, date, &roster));
    }

    if can(state, ctx, &permissions::CLASSROOM_UPDATE) {
        let _ = write!(
            body,
            r#"<form class="panel" method="post" action="{}"><h2>Edit classroom</h2><label>Name <input name="name" value="{}"></label><label>Grade level <input name="grade_level" value="{}"></label><label>Subject <input name="subject" value="{}"></label><label>Capacity <input name="capacity" inputmode="numeric" value="{}"></label><button type="submit">Save</button></form>"#,
            base,
            escape(&classroom.name),
            escape(classroom.grade_level.as_deref().unwrap_or_default()),
            escape(classroom.subject.as_deref().unwrap_or_default()),
            classroom.capacity.map(|n| n.to_string()).unwrap_or_default(),
        );
    }
    if can(state, ctx, &permissions::CLASSROOM_DELETE) {
        let _ = write!(
            body,
            r#"<form class="inline" method="post" action="{}/delete"><button type="submit">Delete classroom</button></form>"#,
            base
        );
    }

    let status = form_failure.as_ref().map(form_failure_status).unwrap_or_default();
    (status, Html(view.render(&body))).into_response()
}

/// Students to offer in the roll call: enrolled in the classroom when
/// enrollments are readable, plus anyone already marked on this date.
async fn roster(
    state: &AppState,
    ctx: &RequestContext,
    classroom: &Classroom,
    marked: &[Attendance],
) -> Vec<(String, Option<String>)> {
    let mut students: Vec<(String, Option<String>)> = Vec::new();

    if can(state, ctx, &permissions::ENROLLMENT_READ) {
        if let Ok(enrollments) =
            enrollment::get_enrollments_action(state.actions(ctx), classroom.school_id.as_deref()).await
        {
            students.extend(
                enrollments
                    .into_iter()
                    .filter(|e| !e.is_withdrawn())
                    .filter(|e| e.classroom_id.as_deref() == Some(classroom.id.as_str()))
                    .map(|e| (e.student_id, e.student_name)),
            );
        }
    }
    for row in marked {
        if !students.iter().any(|(id, _)| *id == row.student_id) {
            students.push((row.student_id.clone(), None));
        }
    }
    students
}

fn attendance_form(base: &str, date: &str, roster: &[(String, Option<String>)]) -> String {
    let mut html = format!(
        r#"<form class="panel" method="post" action="{}/attendance"><h2>Take attendance</h2><label>Date <input name="date" type="date" value="{}" required></label>"#,
        base,
        escape(date)
    );
    for (student_id, name) in roster {
        let _ = write!(
            html,
            r#"<label>{} <select name="{}{}"><option value=""></option>"#,
            escape(name.as_deref().unwrap_or(student_id)),
            STATUS_FIELD_PREFIX,
            escape(student_id)
        );
        for status in AttendanceStatus::ALL {
            let _ = write!(html, r#"<option value="{0}">{0}</option>"#, status.as_str());
        }
        html.push_str("</select></label>");
    }
    html.push_str(r#"<label>Other student id <input name="new_student_id"></label><label>Status <select name="new_status">"#);
    for status in AttendanceStatus::ALL {
        let _ = write!(html, r#"<option value="{0}">{0}</option>"#, status.as_str());
    }
    html.push_str(r#"</select></label><button type="submit">Record attendance</button></form>"#);
    html
}

fn assignments_table(rows: &[Assignment]) -> String {
    if rows.is_empty() {
        return "<p>No assignments.</p>".to_string();
    }
    let mut html = String::from("<table><thead><tr><th>Title</th><th>Due</th><th>Max score</th></tr></thead><tbody>");
    for a in rows {
        let _ = write!(
            html,
            r#"<tr><td><a href="/dashboard/grades?assignmentId={}">{}</a></td><td>{}</td><td>{}</td></tr>"#,
            urlencoding::encode(&a.id),
            escape(&a.title),
            cell(a.due_date.as_deref()),
            a.max_score.map(|s| s.to_string()).unwrap_or_else(|| "&ndash;".to_string()),
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn attendance_table(rows: &[Attendance]) -> String {
    if rows.is_empty() {
        return "<p>No attendance recorded for this date.</p>".to_string();
    }
    let mut html = String::from("<table><thead><tr><th>Student</th><th>Status</th><th>Notes</th></tr></thead><tbody>");
    for r in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&r.student_id),
            cell(r.status.as_deref()),
            cell(r.notes.as_deref()),
        );
    }
    html.push_str("</tbody></table>");
    html
}

// ═══════════════════════════════════════════════════════════════════════════════
// Grades
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct GradesQuery {
    #[serde(rename = "assignmentId")]
    pub assignment_id: Option<String>,
    pub notice: Option<Notice>,
}

/// Records a new grade, or updates one when `grade_id` is set.
#[derive(Debug, Default, Deserialize)]
pub struct GradeForm {
    #[serde(default)]
    pub grade_id: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub score: String,
    #[serde(default)]
    pub feedback: String,
}

fn grades_path(assignment_id: &str) -> String {
    format!("/dashboard/grades?assignmentId={}", urlencoding::encode(assignment_id))
}

pub async fn grades(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Query(query): Query<GradesQuery>,
) -> Response {
    let assignment_id = query.assignment_id.as_deref().and_then(non_empty);
    render_grades(
        &state,
        &ctx,
        uri.path(),
        assignment_id.as_deref(),
        Notice::render(query.notice),
        None,
    )
    .await
}

pub async fn record_grade(
    State(state): State<AppState>,
    ctx: RequestContext,
    uri: Uri,
    Query(query): Query<GradesQuery>,
    Form(form): Form<GradeForm>,
) -> Response {
    let Some(assignment_id) = query.assignment_id.as_deref().and_then(non_empty) else {
        let failure = invalid("Choose an assignment first");
        return render_grades(&state, &ctx, uri.path(), None, String::new(), Some(failure)).await;
    };

    let actions = state.actions(&ctx);
    let result = match (non_empty(&form.grade_id), parse_number("Score", &form.score)) {
        (_, Err(failure)) => Err(failure),
        (Some(grade_id), Ok(score)) => {
            let request = UpdateGradeRequest {
                score,
                feedback: non_empty(&form.feedback),
            };
            academic::update_grade_action(actions, &grade_id, &request)
                .await
                .map(|_| ())
        }
        (None, Ok(score)) => match score {
            None => Err(invalid("Score is required")),
            Some(score) => {
                let request = RecordGradeRequest {
                    student_id: form.student_id.trim().to_string(),
                    score,
                    feedback: non_empty(&form.feedback),
                };
                academic::record_grade_action(actions, &assignment_id, &request)
                    .await
                    .map(|_| ())
            }
        },
    };

    match result {
        Ok(()) => see_other(&grades_path(&assignment_id), Notice::Recorded),
        Err(failure) => {
            render_grades(&state, &ctx, uri.path(), Some(assignment_id.as_str()), String::new(), Some(failure))
                .await
        }
    }
}

async fn render_grades(
    state: &AppState,
    ctx: &RequestContext,
    path: &str,
    assignment_id: Option<&str>,
    notice: String,
    form_failure: Option<ActionFailure>,
) -> Response {
    let view = PageView::new(ctx, &state.gate, path, "Grades");
    let mut body = format!("<h1>Grades</h1>{}", notice);
    if let Some(ref failure) = form_failure {
        body.push_str(&alert(failure));
    }

    let Some(assignment_id) = assignment_id else {
        body.push_str(r#"<form method="get" action="/dashboard/grades"><label>Assignment id <input name="assignmentId" required></label> <button type="submit">Show grades</button></form><p>Or open an assignment from its classroom page.</p>"#);
        let status = form_failure.as_ref().map(form_failure_status).unwrap_or_default();
        return (status, Html(view.render(&body))).into_response();
    };

    let grades = match academic::get_grades_action(state.actions(ctx), assignment_id).await {
        Ok(rows) => rows,
        Err(failure) => return load_failure(&view, failure),
    };

    let action = grades_path(assignment_id);
    let can_update = can(state, ctx, &permissions::GRADE_UPDATE);
    body.push_str(&grades_table(&grades, can_update.then_some(action.as_str())));

    if can(state, ctx, &permissions::GRADE_RECORD) {
        let _ = write!(
            body,
            r#"<form class="panel" method="post" action="{}"><h2>Record grade</h2><label>Student id <input name="student_id" required></label><label>Score <input name="score" inputmode="decimal" required></label><label>Feedback <input name="feedback"></label><button type="submit">Record</button></form>"#,
            escape(&action)
        );
    }

    let status = form_failure.as_ref().map(form_failure_status).unwrap_or_default();
    (status, Html(view.render(&body))).into_response()
}

/// With `update_action`, each row carries an inline score edit form.
fn grades_table(rows: &[Grade], update_action: Option<&str>) -> String {
    if rows.is_empty() {
        return "<p>No grades recorded.</p>".to_string();
    }
    let mut html = String::from("<table><thead><tr><th>Student</th><th>Score</th><th>Feedback</th><th></th></tr></thead><tbody>");
    for g in rows {
        let edit = match update_action {
            Some(action) => format!(
                r#"<form class="inline" method="post" action="{}"><input type="hidden" name="grade_id" value="{}"><input name="score" size="5" inputmode="decimal" value="{}"><button type="submit">Update</button></form>"#,
                escape(action),
                escape(&g.id),
                g.score.map(|s| s.to_string()).unwrap_or_default(),
            ),
            None => String::new(),
        };
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            cell(g.student_id.as_deref()),
            g.score.map(|s| s.to_string()).unwrap_or_else(|| "&ndash;".to_string()),
            cell(g.feedback.as_deref()),
            edit,
        );
    }
    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_attendance_form() {
        let request = parse_attendance_form(&fields(&[
            ("date", "2024-09-02"),
            ("status:st-1", "present"),
            ("status:st-2", ""),
            ("status:st-3", "Late"),
            ("new_student_id", "st-9"),
            ("new_status", "excused"),
        ]))
        .unwrap();

        assert_eq!(request.date, "2024-09-02");
        let marked: Vec<(&str, AttendanceStatus)> = request
            .records
            .iter()
            .map(|r| (r.student_id.as_str(), r.status))
            .collect();
        assert_eq!(
            marked,
            vec![
                ("st-1", AttendanceStatus::Present),
                ("st-3", AttendanceStatus::Late),
                ("st-9", AttendanceStatus::Excused),
            ]
        );
    }

    #[test]
    fn test_parse_attendance_rejects_unknown_status() {
        let failure =
            parse_attendance_form(&fields(&[("date", "2024-09-02"), ("status:st-1", "asleep")]))
                .unwrap_err();
        assert_eq!(failure.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_classroom_form_capacity() {
        let form = ClassroomForm {
            name: "7B".to_string(),
            school_id: "s1".to_string(),
            capacity: "thirty".to_string(),
            ..Default::default()
        };
        assert_eq!(
            form.into_create().unwrap_err().message,
            "Capacity must be a whole number"
        );

        let update = ClassroomForm {
            capacity: "28".to_string(),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.capacity, Some(28));
        assert_eq!(update.name, None);
    }

    #[test]
    fn test_grades_table_edit_forms() {
        let grades: Vec<Grade> = serde_json::from_value(serde_json::json!([
            {"id": "g1", "studentId": "st-1", "score": 91.5}
        ]))
        .unwrap();
        let with_edit = grades_table(&grades, Some("/dashboard/grades?assignmentId=a1"));
        assert!(with_edit.contains(r#"name="grade_id" value="g1""#));
        assert!(with_edit.contains("assignmentId=a1"));
        assert!(!grades_table(&grades, None).contains("<form"));
    }
}
