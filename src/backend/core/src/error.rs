//! Error handling for the EdForge portal.
//!
//! This module provides:
//! - A closed error taxonomy for everything the relay can surface
//! - HTTP status mapping for page responses
//! - User-friendly messages vs detailed internal messages
//! - Error logging with tracing integration and an error counter
//!
//! Every failure that reaches a page is one of the classified codes below.
//! Components only ever see the string produced by
//! [`get_user_friendly_message`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use edforge_core::error::{EdforgeError, ErrorCode, Result};
//!
//! fn load() -> Result<()> {
//!     Err(EdforgeError::new(ErrorCode::NotFound, "School not found"))
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for portal operations.
pub type Result<T> = std::result::Result<T, EdforgeError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
///
/// The first six mirror the classes a backend call can end in. The rest are
/// produced locally by the session layer and at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication/Authorization (4000-4099)
    Unauthorized,
    Forbidden,
    InvalidToken,
    SessionExpired,

    // Request Errors (4100-4199)
    ValidationFailed,
    NotFound,

    // Upstream Errors (3000-3099)
    ServerError,
    NetworkError,

    // Configuration Errors (5000-5099)
    ConfigurationError,

    // Internal Errors (9000-9099)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::Unauthorized => 4000,
            Self::Forbidden => 4001,
            Self::InvalidToken => 4002,
            Self::SessionExpired => 4003,

            Self::ValidationFailed => 4100,
            Self::NotFound => 4101,

            Self::ServerError => 3000,
            Self::NetworkError => 3001,

            Self::ConfigurationError => 5000,

            Self::InternalError => 9000,
        }
    }

    /// Get the HTTP status code used when this error terminates a page.
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidToken | Self::SessionExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ServerError | Self::NetworkError => StatusCode::BAD_GATEWAY,
            Self::ConfigurationError | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for every code that means "there is no usable session".
    pub const fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::InvalidToken | Self::SessionExpired
        )
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            3000..=3099 => "upstream",
            4000..=4099 => "authentication",
            4100..=4199 => "request",
            5000..=5099 => "configuration",
            9000..=9099 => "internal",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// User errors (bad input, missing records, expired sessions)
    Low,
    /// Operational issues (backend unreachable, permission denials)
    Medium,
    /// Backend or local faults
    High,
    /// The process cannot serve requests correctly
    Critical,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::ValidationFailed
            | ErrorCode::NotFound
            | ErrorCode::Unauthorized
            | ErrorCode::SessionExpired => Self::Low,

            ErrorCode::Forbidden | ErrorCode::InvalidToken | ErrorCode::NetworkError => {
                Self::Medium
            }

            ErrorCode::ServerError | ErrorCode::InternalError => Self::High,

            ErrorCode::ConfigurationError => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Details
// ═══════════════════════════════════════════════════════════════════════════════

/// Additional structured details about an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Additional context key-value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    /// Related entity type (school, classroom, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Related entity ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// HTTP status returned by the backend, when the error came from one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,

    /// Field that failed validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn with_upstream_status(mut self, status: u16) -> Self {
        self.upstream_status = Some(status);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for the portal.
#[derive(Error, Debug)]
pub struct EdforgeError {
    /// Machine-readable error code
    code: ErrorCode,

    /// Message safe to show to the user
    user_message: Cow<'static, str>,

    /// Detailed internal message (for logging only)
    internal_message: Option<String>,

    /// Additional structured details
    details: ErrorDetails,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for EdforgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl EdforgeError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            details: ErrorDetails::default(),
            source: None,
        };
        error.record_metrics();
        error
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Create an internal error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(ErrorCode::InternalError, "An internal error occurred", message)
    }

    /// Create a not found error.
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        let entity_id = entity_id.into();
        Self::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", entity_type, entity_id),
        )
        .with_details(ErrorDetails::new().with_entity(&entity_type, &entity_id))
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message.into())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Add error details.
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = details;
        self
    }

    /// Add internal message.
    pub fn with_internal_message(mut self, message: impl Into<String>) -> Self {
        self.internal_message = Some(message.into());
        self
    }

    /// Add context to details.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.context.insert(key.into(), v);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the user-facing message.
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    /// Get the internal message (if any).
    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    /// Get the error details.
    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();
        let upstream_status = self.details.upstream_status;

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    upstream_status = ?upstream_status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    source = ?self.source,
                    "Request failed"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    upstream_status = ?upstream_status,
                    user_message = %self.user_message,
                    "Request failed"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    upstream_status = ?upstream_status,
                    user_message = %self.user_message,
                    "Request failed"
                );
            }
        }
    }

    fn record_metrics(&self) {
        counter!(
            "edforge_errors_total",
            "code" => self.code.to_string(),
            "category" => self.code.category().to_string(),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// User-facing translation
// ═══════════════════════════════════════════════════════════════════════════════

/// Translate any classified error into the message a page may display.
///
/// This is the only place error text for end users is produced. Validation
/// failures keep the backend's (or validator's) own wording because it names
/// the offending field; every other class gets a fixed sentence so internal
/// details never leak into markup.
pub fn get_user_friendly_message(error: &EdforgeError) -> String {
    match error.code() {
        ErrorCode::Unauthorized | ErrorCode::InvalidToken | ErrorCode::SessionExpired => {
            "Your session has expired. Please sign in again.".to_string()
        }
        ErrorCode::Forbidden => "You do not have permission to perform this action.".to_string(),
        ErrorCode::NotFound => "The requested record could not be found.".to_string(),
        ErrorCode::ValidationFailed => {
            let message = error.user_message().trim();
            if message.is_empty() {
                "Some of the information provided is invalid. Please check and try again."
                    .to_string()
            } else {
                message.to_string()
            }
        }
        ErrorCode::NetworkError => {
            "We could not reach the EdForge services. Please try again in a moment.".to_string()
        }
        ErrorCode::ServerError | ErrorCode::ConfigurationError | ErrorCode::InternalError => {
            "Something went wrong on our side. Please try again later.".to_string()
        }
    }
}

/// The failure form of a server action, as handed to a page.
///
/// Carries the class (so a page can redirect or render the deny page) and
/// nothing but the translated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl ActionFailure {
    pub fn requires_sign_in(&self) -> bool {
        self.code.requires_sign_in()
    }

    pub fn is_forbidden(&self) -> bool {
        self.code == ErrorCode::Forbidden
    }
}

impl From<EdforgeError> for ActionFailure {
    fn from(error: EdforgeError) -> Self {
        error.log();
        Self {
            code: error.code(),
            message: get_user_friendly_message(&error),
        }
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Integration
// ═══════════════════════════════════════════════════════════════════════════════

impl IntoResponse for EdforgeError {
    fn into_response(self) -> Response {
        self.log();

        if self.code.requires_sign_in() {
            return Redirect::to(crate::session::SIGN_IN_PATH).into_response();
        }

        let status = self.http_status();
        let message = get_user_friendly_message(&self);
        (status, Html(crate::pages::layout::error_page(status, &message))).into_response()
    }
}

/// Terminal rendering of a failed action that leaves nothing else to show.
impl IntoResponse for ActionFailure {
    fn into_response(self) -> Response {
        if self.requires_sign_in() {
            return Redirect::to(crate::session::SIGN_IN_PATH).into_response();
        }

        let status = self.code.http_status();
        (status, Html(crate::pages::layout::error_page(status, &self.message))).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Common Error Types
// ═══════════════════════════════════════════════════════════════════════════════

impl From<reqwest::Error> for EdforgeError {
    fn from(error: reqwest::Error) -> Self {
        let (code, user_msg) = if error.is_timeout() {
            (ErrorCode::NetworkError, "The backend service did not respond in time")
        } else if error.is_connect() {
            (ErrorCode::NetworkError, "Failed to connect to the backend service")
        } else if error.is_decode() {
            (ErrorCode::ServerError, "The backend service returned an unreadable response")
        } else if error.is_builder() {
            (ErrorCode::InternalError, "The backend request could not be built")
        } else {
            (ErrorCode::NetworkError, "Network error occurred")
        };

        Self::with_internal(code, user_msg, error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for EdforgeError {
    fn from(error: serde_json::Error) -> Self {
        Self::with_internal(
            ErrorCode::ServerError,
            "The backend service returned an unexpected response",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<jsonwebtoken::errors::Error> for EdforgeError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        let code = match error.kind() {
            ErrorKind::ExpiredSignature => ErrorCode::SessionExpired,
            _ => ErrorCode::InvalidToken,
        };

        Self::with_internal(code, "Your session is not valid", error.to_string())
            .with_source(error)
    }
}

impl From<config::ConfigError> for EdforgeError {
    fn from(error: config::ConfigError) -> Self {
        Self::with_internal(
            ErrorCode::ConfigurationError,
            "Configuration error occurred",
            error.to_string(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::Forbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NetworkError.http_status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_requires_sign_in() {
        assert!(ErrorCode::Unauthorized.requires_sign_in());
        assert!(ErrorCode::SessionExpired.requires_sign_in());
        assert!(ErrorCode::InvalidToken.requires_sign_in());
        assert!(!ErrorCode::Forbidden.requires_sign_in());
        assert!(!ErrorCode::ServerError.requires_sign_in());
    }

    #[test]
    fn test_error_context() {
        let error = EdforgeError::validation("Name is required")
            .with_context("field", "name")
            .with_context("action", "create_school");

        assert!(error.details().context.contains_key("field"));
        assert!(error.details().context.contains_key("action"));
    }

    #[test]
    fn test_not_found_carries_entity() {
        let error = EdforgeError::not_found("School", "sch-1");
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.details().entity_type.as_deref(), Some("School"));
        assert_eq!(error.details().entity_id.as_deref(), Some("sch-1"));
    }

    #[test]
    fn test_friendly_message_hides_internal_detail() {
        let error = EdforgeError::with_internal(
            ErrorCode::ServerError,
            "upstream exploded",
            "panic at school-service/src/db.rs:42",
        );
        let message = get_user_friendly_message(&error);
        assert!(!message.contains("db.rs"));
        assert!(!message.contains("exploded"));
    }

    #[test]
    fn test_friendly_message_keeps_validation_wording() {
        let error = EdforgeError::validation("Email must be a valid address");
        assert_eq!(
            get_user_friendly_message(&error),
            "Email must be a valid address"
        );

        let blank = EdforgeError::validation("");
        assert!(get_user_friendly_message(&blank).contains("invalid"));
    }

    #[test]
    fn test_friendly_message_per_class() {
        let cases = [
            (ErrorCode::Unauthorized, "sign in"),
            (ErrorCode::Forbidden, "permission"),
            (ErrorCode::NotFound, "could not be found"),
            (ErrorCode::NetworkError, "could not reach"),
            (ErrorCode::ServerError, "went wrong"),
        ];
        for (code, fragment) in cases {
            let message = get_user_friendly_message(&EdforgeError::new(code, "x"));
            assert!(message.contains(fragment), "{:?} -> {}", code, message);
        }
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::ValidationFailed),
            ErrorSeverity::Low
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::NetworkError),
            ErrorSeverity::Medium
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::ServerError),
            ErrorSeverity::High
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::ConfigurationError),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_error_display() {
        let error = EdforgeError::with_internal(
            ErrorCode::NetworkError,
            "Failed to connect to the backend service",
            "tcp connect error: 10.0.0.4:443",
        );

        let display = format!("{}", error);
        assert!(display.contains("NetworkError"));
        assert!(display.contains("Failed to connect"));
        assert!(display.contains("10.0.0.4"));
    }

    #[test]
    fn test_unauthorized_response_redirects_to_sign_in() {
        let response = EdforgeError::unauthorized("no session").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            crate::session::SIGN_IN_PATH
        );
    }

    #[test]
    fn test_action_failure_translates() {
        let failure = ActionFailure::from(EdforgeError::with_internal(
            ErrorCode::NetworkError,
            "connect failed",
            "tcp 10.0.0.4:443 refused",
        ));
        assert_eq!(failure.code, ErrorCode::NetworkError);
        assert!(!failure.message.contains("10.0.0.4"));
        assert!(!failure.requires_sign_in());

        let expired = ActionFailure::from(EdforgeError::new(ErrorCode::SessionExpired, "x"));
        assert!(expired.requires_sign_in());
        assert_eq!(expired.into_response().status(), StatusCode::SEE_OTHER);
    }

    #[test]
    fn test_forbidden_response_renders_page() {
        let response = EdforgeError::forbidden("denied").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
