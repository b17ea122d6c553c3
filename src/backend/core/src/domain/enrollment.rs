use serde::{Deserialize, Serialize};

use super::Extra;
use crate::validation::{Validate, ValidationResult, Validator};

pub const WITHDRAWN: &str = "withdrawn";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classroom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Enrollment {
    pub fn is_withdrawn(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(WITHDRAWN))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnrollmentRequest {
    pub student_id: String,
    pub school_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classroom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<String>,
}

impl Validate for CreateEnrollmentRequest {
    fn validate(&self) -> ValidationResult<()> {
        Validator::new()
            .required("studentId", &self.student_id)
            .required("schoolId", &self.school_id)
            .date_opt("enrollmentDate", self.enrollment_date.as_deref())
            .finish()
    }
}

/// Body of the PATCH that withdraws an enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawEnrollmentRequest {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawal_date: Option<String>,
}

impl WithdrawEnrollmentRequest {
    pub fn new(reason: Option<String>, withdrawal_date: Option<String>) -> Self {
        Self {
            status: WITHDRAWN.to_string(),
            reason: reason.filter(|r| !r.trim().is_empty()),
            withdrawal_date: withdrawal_date.filter(|d| !d.trim().is_empty()),
        }
    }
}

impl Validate for WithdrawEnrollmentRequest {
    fn validate(&self) -> ValidationResult<()> {
        Validator::new()
            .required("status", &self.status)
            .date_opt("withdrawalDate", self.withdrawal_date.as_deref())
            .finish()
    }
}
