//! `/dashboard` overview: headline counts and enrollment per school.

use std::collections::BTreeMap;
use std::fmt::Write;

use axum::{
    extract::State,
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
};

use super::charts::{bar_chart, BarDatum};
use super::{alert, escape, PageView};
use crate::actions::{academic, enrollment, school, user, ActionResult};
use crate::api::AppState;
use crate::context::RequestContext;
use crate::domain::{Enrollment, School};
use crate::error::ActionFailure;
use crate::rbac::{permissions, sign_in_url};

struct Card {
    label: &'static str,
    href: &'static str,
    value: usize,
}

pub async fn overview(State(state): State<AppState>, ctx: RequestContext, uri: Uri) -> Response {
    let actions = state.actions(&ctx);
    let mut cards = Vec::new();
    let mut failures: Vec<ActionFailure> = Vec::new();

    let mut collect = |result: ActionResult<usize>, label: &'static str, href: &'static str| {
        match result {
            Ok(value) => cards.push(Card { label, href, value }),
            Err(failure) => failures.push(failure),
        }
    };

    let schools = if actions.can(&permissions::SCHOOL_READ) {
        let result = school::get_schools_action(actions).await;
        collect(result.as_ref().map(Vec::len).map_err(Clone::clone), "Schools", "/dashboard/schools");
        result.unwrap_or_default()
    } else {
        Vec::new()
    };

    if actions.can(&permissions::CLASSROOM_READ) {
        let result = academic::get_classrooms_action(actions, None).await;
        collect(result.map(|c| c.len()), "Classrooms", "/dashboard/classrooms");
    }

    let enrollments = if actions.can(&permissions::ENROLLMENT_READ) {
        let result = enrollment::get_enrollments_action(actions, None).await;
        collect(
            result
                .as_ref()
                .map(|e| e.iter().filter(|e| !e.is_withdrawn()).count())
                .map_err(Clone::clone),
            "Active enrollments",
            "/dashboard/enrollments",
        );
        result.unwrap_or_default()
    } else {
        Vec::new()
    };

    if actions.can(&permissions::USER_READ) {
        let result = user::get_users_action(actions).await;
        collect(result.map(|u| u.len()), "Users", "/dashboard/admin/users");
    }

    // Every load failed because the session is gone: start over at sign-in.
    if cards.is_empty() && failures.iter().any(ActionFailure::requires_sign_in) {
        return Redirect::to(&sign_in_url(uri.path())).into_response();
    }

    let view = PageView::new(&ctx, &state.gate, uri.path(), "Overview");
    let greeting = ctx
        .session()
        .map(|s| format!("<p>Welcome back, {}.</p>", escape(s.display_name())))
        .unwrap_or_default();

    let mut body = format!("<h1>Overview</h1>{}", greeting);
    for failure in &failures {
        body.push_str(&alert(failure));
    }
    body.push_str(r#"<div class="cards">"#);
    for card in &cards {
        let _ = write!(
            body,
            r#"<a class="card" href="{}"><div>{}</div><div class="value">{}</div></a>"#,
            card.href,
            escape(card.label),
            card.value
        );
    }
    body.push_str("</div>");

    if !enrollments.is_empty() {
        body.push_str(&bar_chart(
            "Active enrollments per school",
            &enrollment_per_school(&schools, &enrollments),
        ));
    }

    Html(view.render(&body)).into_response()
}

/// Active enrollments grouped by school, labelled with the school name when
/// it is known. Schools without enrollments still get a (zero) bar.
pub fn enrollment_per_school(schools: &[School], enrollments: &[Enrollment]) -> Vec<BarDatum> {
    let mut counts: BTreeMap<&str, usize> = schools.iter().map(|s| (s.id.as_str(), 0)).collect();
    for e in enrollments.iter().filter(|e| !e.is_withdrawn()) {
        let key = e.school_id.as_deref().unwrap_or("Unassigned");
        *counts.entry(key).or_default() += 1;
    }

    let mut data: Vec<BarDatum> = counts
        .into_iter()
        .map(|(id, count)| {
            let label = schools
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or(id);
            BarDatum::new(label, count as f64)
        })
        .collect();
    data.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enrollment_per_school() {
        let schools: Vec<School> = serde_json::from_value(json!([
            {"id": "s1", "name": "North High"},
            {"id": "s2", "name": "South Elementary"},
            {"id": "s3", "name": "East Middle"}
        ]))
        .unwrap();
        let enrollments: Vec<Enrollment> = serde_json::from_value(json!([
            {"id": "e1", "studentId": "a", "schoolId": "s1"},
            {"id": "e2", "studentId": "b", "schoolId": "s1"},
            {"id": "e3", "studentId": "c", "schoolId": "s2"},
            {"id": "e4", "studentId": "d", "schoolId": "s2", "status": "withdrawn"},
            {"id": "e5", "studentId": "e", "schoolId": "s9"}
        ]))
        .unwrap();

        let data = enrollment_per_school(&schools, &enrollments);
        assert_eq!(
            data,
            vec![
                BarDatum::new("North High", 2.0),
                BarDatum::new("South Elementary", 1.0),
                BarDatum::new("s9", 1.0),
                BarDatum::new("East Middle", 0.0),
            ]
        );
    }
}
