use serde::{Deserialize, Serialize};

use super::Extra;
use crate::validation::{Validate, ValidationResult, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl User {
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> ValidationResult<()> {
        Validator::new()
            .required("email", &self.email)
            .required("firstName", &self.first_name)
            .required("lastName", &self.last_name)
            .required("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            email: "grace@school.edu".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: "teacher".to_string(),
            school_id: None,
        }
    }

    #[test]
    fn test_create_user_valid() {
        assert!(request().is_valid());
    }

    #[test]
    fn test_create_user_accepts_tenant_roles() {
        assert!(CreateUserRequest {
            role: "registrar".to_string(),
            ..request()
        }
        .is_valid());

        let errors = CreateUserRequest {
            role: " ".to_string(),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.first().unwrap().message, "Role is required");
    }

    #[test]
    fn test_full_name() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u1", "email": "g@s.edu", "firstName": "Grace", "lastName": "Hopper"
        }))
        .unwrap();
        assert_eq!(user.full_name(), "Grace Hopper");

        let bare: User =
            serde_json::from_value(serde_json::json!({"id": "u2", "email": "x@s.edu"})).unwrap();
        assert_eq!(bare.full_name(), "x@s.edu");
    }
}
