//! Academic service actions: classrooms, assignments, grades and attendance.

use reqwest::Method;
use tracing::instrument;

use super::{ActionContext, ActionResult};
use crate::client::endpoints;
use crate::domain::{
    Assignment, Attendance, Classroom, CreateAssignmentRequest, CreateClassroomRequest, Grade,
    ListResponse, RecordAttendanceRequest, RecordGradeRequest, UpdateClassroomRequest,
    UpdateGradeRequest,
};
use crate::rbac::permissions;

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = ?school_id))]
pub async fn get_classrooms_action(
    ctx: ActionContext<'_>,
    school_id: Option<&str>,
) -> ActionResult<Vec<Classroom>> {
    Ok(ctx.list(&endpoints::classrooms(school_id)).await?)
}

/// Single classroom, used by the classroom detail page.
#[instrument(skip_all, fields(request_id = %ctx.request.request_id, classroom_id = %id))]
pub async fn get_classroom_action(ctx: ActionContext<'_>, id: &str) -> ActionResult<Classroom> {
    Ok(ctx.item(&endpoints::classroom(id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id))]
pub async fn create_classroom_action(
    ctx: ActionContext<'_>,
    request: &CreateClassroomRequest,
) -> ActionResult<Option<Classroom>> {
    Ok(ctx
        .mutate(&permissions::CLASSROOM_CREATE, Method::POST, endpoints::CLASSROOMS, request)
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, classroom_id = %id))]
pub async fn update_classroom_action(
    ctx: ActionContext<'_>,
    id: &str,
    request: &UpdateClassroomRequest,
) -> ActionResult<Option<Classroom>> {
    Ok(ctx
        .mutate(&permissions::CLASSROOM_UPDATE, Method::PUT, &endpoints::classroom(id), request)
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, classroom_id = %id))]
pub async fn delete_classroom_action(ctx: ActionContext<'_>, id: &str) -> ActionResult<()> {
    Ok(ctx.remove(&permissions::CLASSROOM_DELETE, &endpoints::classroom(id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, classroom_id = %classroom_id))]
pub async fn get_assignments_action(
    ctx: ActionContext<'_>,
    classroom_id: &str,
) -> ActionResult<Vec<Assignment>> {
    Ok(ctx.list(&endpoints::assignments(classroom_id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, classroom_id = %classroom_id))]
pub async fn create_assignment_action(
    ctx: ActionContext<'_>,
    classroom_id: &str,
    request: &CreateAssignmentRequest,
) -> ActionResult<Option<Assignment>> {
    Ok(ctx
        .mutate(
            &permissions::ASSIGNMENT_CREATE,
            Method::POST,
            &endpoints::assignments(classroom_id),
            request,
        )
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, assignment_id = %assignment_id))]
pub async fn get_grades_action(
    ctx: ActionContext<'_>,
    assignment_id: &str,
) -> ActionResult<Vec<Grade>> {
    Ok(ctx.list(&endpoints::grades(assignment_id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, assignment_id = %assignment_id))]
pub async fn record_grade_action(
    ctx: ActionContext<'_>,
    assignment_id: &str,
    request: &RecordGradeRequest,
) -> ActionResult<Option<Grade>> {
    Ok(ctx
        .mutate(
            &permissions::GRADE_RECORD,
            Method::POST,
            &endpoints::grades(assignment_id),
            request,
        )
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, grade_id = %grade_id))]
pub async fn update_grade_action(
    ctx: ActionContext<'_>,
    grade_id: &str,
    request: &UpdateGradeRequest,
) -> ActionResult<Option<Grade>> {
    Ok(ctx
        .mutate(&permissions::GRADE_UPDATE, Method::PUT, &endpoints::grade(grade_id), request)
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, classroom_id = %classroom_id, date = ?date))]
pub async fn get_attendance_action(
    ctx: ActionContext<'_>,
    classroom_id: &str,
    date: Option<&str>,
) -> ActionResult<Vec<Attendance>> {
    Ok(ctx.list(&endpoints::attendance(classroom_id, date)).await?)
}

/// Records one roll call. The backend answers with the stored rows, or
/// nothing at all.
#[instrument(skip_all, fields(request_id = %ctx.request.request_id, classroom_id = %classroom_id))]
pub async fn record_attendance_action(
    ctx: ActionContext<'_>,
    classroom_id: &str,
    request: &RecordAttendanceRequest,
) -> ActionResult<Vec<Attendance>> {
    let rows: Option<ListResponse<Attendance>> = ctx
        .mutate(
            &permissions::ATTENDANCE_RECORD,
            Method::POST,
            &endpoints::attendance(classroom_id, None),
            request,
        )
        .await?;
    Ok(rows.map(ListResponse::into_vec).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::*;
    use crate::domain::{AttendanceEntry, AttendanceStatus};
    use crate::error::ErrorCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_classrooms_filtered_by_school() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/classrooms"))
            .and(query_param("schoolId", "s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "c1", "name": "7B Science", "schoolId": "s1", "room": "B-12"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = signed_in("teacher");
        let client = client(&server.uri());
        let gate = open_gate();
        let classrooms = get_classrooms_action(ActionContext::new(&ctx, &client, &gate), Some("s1"))
            .await
            .unwrap();

        assert_eq!(classrooms[0].name, "7B Science");
        assert_eq!(classrooms[0].extra.get("room").unwrap(), "B-12");
    }

    #[tokio::test]
    async fn test_score_range_is_left_to_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assignments/a1/grades"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "score must not be less than 0"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = signed_in("teacher");
        let client = client(&server.uri());
        let gate = role_gate();
        let request = RecordGradeRequest {
            student_id: "st-1".to_string(),
            score: -5.0,
            feedback: None,
        };

        let failure = record_grade_action(ActionContext::new(&ctx, &client, &gate), "a1", &request)
            .await
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::ValidationFailed);
        assert_eq!(failure.message, "score must not be less than 0");
    }

    #[tokio::test]
    async fn test_update_grade_uses_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/grades/g1"))
            .and(body_json(json!({"score": 88.5})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "g1", "score": 88.5})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ctx = signed_in("teacher");
        let client = client(&server.uri());
        let gate = role_gate();
        let request = UpdateGradeRequest {
            score: Some(88.5),
            feedback: None,
        };

        let grade = update_grade_action(ActionContext::new(&ctx, &client, &gate), "g1", &request)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grade.score, Some(88.5));
    }

    #[tokio::test]
    async fn test_record_attendance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/classrooms/c1/attendance"))
            .and(body_json(json!({
                "date": "2024-09-02",
                "records": [{"studentId": "st-1", "status": "late"}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                {"id": "at-1", "studentId": "st-1", "status": "late", "date": "2024-09-02"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = signed_in("teacher");
        let client = client(&server.uri());
        let gate = role_gate();
        let request = RecordAttendanceRequest {
            date: "2024-09-02".to_string(),
            records: vec![AttendanceEntry {
                student_id: "st-1".to_string(),
                status: AttendanceStatus::Late,
                notes: None,
            }],
        };

        let rows = record_attendance_action(ActionContext::new(&ctx, &client, &gate), "c1", &request)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_backend_validation_message_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/classrooms"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": ["Classroom name already exists in this school"]
            })))
            .mount(&server)
            .await;

        let ctx = signed_in("school_admin");
        let client = client(&server.uri());
        let gate = role_gate();
        let request = CreateClassroomRequest {
            name: "7B".to_string(),
            school_id: "s1".to_string(),
            ..Default::default()
        };

        let failure = create_classroom_action(ActionContext::new(&ctx, &client, &gate), &request)
            .await
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::ValidationFailed);
        assert_eq!(failure.message, "Classroom name already exists in this school");
    }

    #[tokio::test]
    async fn test_server_error_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string("NullPointerException at GradeService.java:88"),
            )
            .mount(&server)
            .await;

        let ctx = signed_in("teacher");
        let client = client(&server.uri());
        let gate = open_gate();
        let failure = get_grades_action(ActionContext::new(&ctx, &client, &gate), "a1")
            .await
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::ServerError);
        assert!(!failure.message.contains("GradeService"));
    }
}
