//! Backend endpoint paths, relative to the gateway base URL.
//!
//! Ids and query values are percent-encoded so a crafted id cannot change
//! which resource is addressed.

use urlencoding::encode;

// Collection routes
pub const SCHOOLS: &str = "/schools";
pub const CLASSROOMS: &str = "/classrooms";
pub const ENROLLMENTS: &str = "/enrollments";
pub const USERS: &str = "/users";

// School service
pub fn school(id: &str) -> String {
    format!("{}/{}", SCHOOLS, encode(id))
}

pub fn departments(school_id: &str) -> String {
    format!("{}/departments", school(school_id))
}

pub fn academic_years(school_id: &str) -> String {
    format!("{}/academic-years", school(school_id))
}

pub fn grading_periods(academic_year_id: &str) -> String {
    format!("/academic-years/{}/grading-periods", encode(academic_year_id))
}

pub fn holidays(school_id: &str) -> String {
    format!("{}/holidays", school(school_id))
}

// Academic service
pub fn classrooms(school_id: Option<&str>) -> String {
    with_query(CLASSROOMS, &[("schoolId", school_id)])
}

pub fn classroom(id: &str) -> String {
    format!("{}/{}", CLASSROOMS, encode(id))
}

pub fn assignments(classroom_id: &str) -> String {
    format!("{}/assignments", classroom(classroom_id))
}

pub fn grades(assignment_id: &str) -> String {
    format!("/assignments/{}/grades", encode(assignment_id))
}

pub fn grade(id: &str) -> String {
    format!("/grades/{}", encode(id))
}

pub fn attendance(classroom_id: &str, date: Option<&str>) -> String {
    with_query(&format!("{}/attendance", classroom(classroom_id)), &[("date", date)])
}

// Enrollment service
pub fn enrollments(school_id: Option<&str>) -> String {
    with_query(ENROLLMENTS, &[("schoolId", school_id)])
}

pub fn enrollment(id: &str) -> String {
    format!("{}/{}", ENROLLMENTS, encode(id))
}

/// Append the present, non-empty query parameters.
fn with_query(path: &str, params: &[(&str, Option<&str>)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter_map(|(k, v)| v.filter(|v| !v.is_empty()).map(|v| format!("{}={}", k, encode(v))))
        .collect();

    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query.join("&"))
    }
}
