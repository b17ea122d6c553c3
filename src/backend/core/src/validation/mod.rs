//! Request validation for server action payloads.
//!
//! Action request types implement [`Validate`]. The portal checks presence
//! and date syntax only; lengths, ranges and allowed values belong to the
//! backend, whose 400/422 answers come back as `ValidationFailed`. A failing
//! request is turned into a `ValidationFailed` error carrying the first field
//! message, and the action returns before any backend call is made.
//!
//! # Example
//!
//! ```rust,ignore
//! impl Validate for CreateHolidayRequest {
//!     fn validate(&self) -> ValidationResult<()> {
//!         Validator::new()
//!             .required("name", &self.name)
//!             .date("date", &self.date)
//!             .finish()
//!     }
//! }
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::error::{EdforgeError, ErrorDetails};

/// Dates travel as `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// The kind of validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Field is required but was missing or blank.
    Required,
    /// Not a `YYYY-MM-DD` date.
    InvalidDate,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "is required"),
            Self::InvalidDate => write!(f, "must be a date in YYYY-MM-DD format"),
        }
    }
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub kind: ValidationErrorKind,
    /// Human-readable message, e.g. "Name is required".
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        let field = field.into();
        let message = format!("{} {}", capitalize(&humanize(&field)), kind);
        Self {
            field,
            kind,
            message,
        }
    }
}

/// Field errors in the order the rules ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The first failure, which is what the user sees.
    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Result type for validation operations.
pub type ValidationResult<T> = std::result::Result<T, ValidationErrors>;

impl From<ValidationErrors> for EdforgeError {
    fn from(errors: ValidationErrors) -> Self {
        let (message, field) = match errors.first() {
            Some(first) => (first.message.clone(), Some(first.field.clone())),
            None => ("Invalid input".to_string(), None),
        };

        let mut details = ErrorDetails::new().with_context("fields", &errors.errors);
        if let Some(field) = field {
            details = details.with_field(field);
        }

        EdforgeError::validation(message)
            .with_internal_message(errors.to_string())
            .with_details(details)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validate Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for types that can be validated before they are sent anywhere.
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validator (rule builder)
// ═══════════════════════════════════════════════════════════════════════════════

/// Collects rule failures for one payload.
#[derive(Debug, Default)]
#[must_use]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(mut self, field: &str, kind: ValidationErrorKind) -> Self {
        self.errors.add(FieldError::new(field, kind));
        self
    }

    /// Non-blank string.
    pub fn required(self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            return self.fail(field, ValidationErrorKind::Required);
        }
        self
    }

    /// Present and non-blank.
    pub fn required_opt(self, field: &str, value: Option<&str>) -> Self {
        self.required(field, value.unwrap_or_default())
    }

    /// `YYYY-MM-DD`. Blank values are left to `required`.
    pub fn date(self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() || parse_date(value).is_some() {
            self
        } else {
            self.fail(field, ValidationErrorKind::InvalidDate)
        }
    }

    pub fn date_opt(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.date(field, v),
            None => self,
        }
    }

    pub fn finish(self) -> ValidationResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// `start_date` / `startDate` -> `start date`.
fn humanize(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        if c == '_' || c == '-' {
            out.push(' ');
        } else if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
