//! School service records: schools, departments, academic calendar.

use serde::{Deserialize, Serialize};

use super::Extra;
use crate::validation::{Validate, ValidationResult, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchoolRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,
}

impl Validate for CreateSchoolRequest {
    fn validate(&self) -> ValidationResult<()> {
        Validator::new()
            .required("name", &self.name)
            .finish()
    }
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSchoolRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for UpdateSchoolRequest {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Validator::new();
        if let Some(ref name) = self.name {
            v = v.required("name", name);
        }
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_of_department: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for CreateDepartmentRequest {
    fn validate(&self) -> ValidationResult<()> {
        Validator::new()
            .required("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAcademicYearRequest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
}

impl Validate for CreateAcademicYearRequest {
    fn validate(&self) -> ValidationResult<()> {
        Validator::new()
            .required("name", &self.name)
            .required("startDate", &self.start_date)
            .date("startDate", &self.start_date)
            .required("endDate", &self.end_date)
            .date("endDate", &self.end_date)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingPeriod {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGradingPeriodRequest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

impl Validate for CreateGradingPeriodRequest {
    fn validate(&self) -> ValidationResult<()> {
        Validator::new()
            .required("name", &self.name)
            .required("startDate", &self.start_date)
            .date("startDate", &self.start_date)
            .required("endDate", &self.end_date)
            .date("endDate", &self.end_date)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHolidayRequest {
    pub name: String,
    pub date: String,
    /// Last day of a multi-day break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for CreateHolidayRequest {
    fn validate(&self) -> ValidationResult<()> {
        Validator::new()
            .required("name", &self.name)
            .required("date", &self.date)
            .date("date", &self.date)
            .date_opt("endDate", self.end_date.as_deref())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_school_serializes_camel_case() {
        let request = CreateSchoolRequest {
            name: "North High".to_string(),
            principal_name: Some("R. Okafor".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["principalName"], "R. Okafor");
        assert!(json.get("code").is_none());
    }

    #[test]
    fn test_create_school_validation() {
        assert!(CreateSchoolRequest {
            name: "North High".to_string(),
            ..Default::default()
        }
        .is_valid());

        // Short names, codes and email syntax are the backend's call.
        assert!(CreateSchoolRequest {
            name: "X".to_string(),
            code: Some("A".to_string()),
            email: Some("front-office".to_string()),
            ..Default::default()
        }
        .is_valid());

        let errors = CreateSchoolRequest {
            name: " ".to_string(),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.has_field("name"));
    }

    #[test]
    fn test_academic_year_dates() {
        let request = CreateAcademicYearRequest {
            name: "2024/25".to_string(),
            start_date: "2024-09-01".to_string(),
            end_date: "30/06/2025".to_string(),
            is_current: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.has_field("endDate"));
        assert!(!errors.has_field("startDate"));
    }

    #[test]
    fn test_holiday_end_date_optional() {
        let single = CreateHolidayRequest {
            name: "Founders Day".to_string(),
            date: "2024-10-14".to_string(),
            ..Default::default()
        };
        assert!(single.is_valid());

        let malformed = CreateHolidayRequest {
            end_date: Some("next week".to_string()),
            ..single
        };
        assert!(!malformed.is_valid());
    }

    #[test]
    fn test_update_school_partial() {
        assert!(UpdateSchoolRequest::default().is_valid());
        assert!(!UpdateSchoolRequest {
            name: Some(String::new()),
            ..Default::default()
        }
        .is_valid());
    }
}
