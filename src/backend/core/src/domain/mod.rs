//! Records exchanged with the backend services.
//!
//! The backend owns these shapes. Each type names the fields the portal
//! reads and keeps every other field in `extra`, so a record fetched and sent
//! back passes through unchanged.

pub mod academic;
pub mod enrollment;
pub mod school;
pub mod user;

pub use academic::*;
pub use enrollment::*;
pub use school::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Fields the portal does not interpret.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// A collection response. Services return either a bare array or an
/// envelope with `data` or `items`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
    Items { items: Vec<T> },
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Data { data: items } | Self::Items { items } => items,
        }
    }
}

/// A single-record response, bare or wrapped in `data`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ItemResponse<T> {
    Data { data: T },
    Bare(T),
}

impl<T> ItemResponse<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Data { data } | Self::Bare(data) => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_shapes() {
        let bare: ListResponse<School> =
            serde_json::from_str(r#"[{"id":"s1","name":"North"}]"#).unwrap();
        let data: ListResponse<School> =
            serde_json::from_str(r#"{"data":[{"id":"s1","name":"North"}],"total":1}"#).unwrap();
        let items: ListResponse<School> =
            serde_json::from_str(r#"{"items":[{"id":"s1","name":"North"}]}"#).unwrap();

        for list in [bare, data, items] {
            let schools = list.into_vec();
            assert_eq!(schools.len(), 1);
            assert_eq!(schools[0].name, "North");
        }
    }

    #[test]
    fn test_item_shapes() {
        let wrapped: ItemResponse<School> =
            serde_json::from_str(r#"{"data":{"id":"s1","name":"North"}}"#).unwrap();
        assert_eq!(wrapped.into_inner().id, "s1");

        let bare: ItemResponse<School> =
            serde_json::from_str(r#"{"id":"s2","name":"South"}"#).unwrap();
        assert_eq!(bare.into_inner().id, "s2");
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = serde_json::json!({
            "id": "s1",
            "name": "North",
            "districtCode": "D-7",
            "accreditation": {"body": "NEASC", "year": 2021}
        });
        let school: School = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(school.extra.get("districtCode").unwrap(), "D-7");
        assert_eq!(serde_json::to_value(&school).unwrap(), raw);
    }
}
