#![allow(clippy::result_large_err)]
//! # EdForge Core
//!
//! Server-rendered portal for the EdForge education management platform.
//!
//! ## Architecture
//!
//! - **Session**: JWT session cookie resolved into a [`context::RequestContext`]
//! - **RBAC**: role policy deciding which pages and actions a session may use
//! - **Actions**: server-side operations that relay to the backend services
//!   through the [`client::ApiClient`] with the caller's bearer token
//! - **Pages**: dashboard, schools, classrooms, grades, enrollments, users
//! - **Telemetry**: structured logging, optional OTLP tracing, Prometheus metrics

pub mod actions;
pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod rbac;
pub mod session;
pub mod telemetry;
pub mod validation;

pub use error::{ActionFailure, EdforgeError, ErrorCode, ErrorSeverity, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{ActionContext, ActionResult};
    pub use crate::api::{build_router, AppState};
    pub use crate::client::ApiClient;
    pub use crate::config::Config;
    pub use crate::context::RequestContext;
    pub use crate::error::{ActionFailure, EdforgeError, ErrorCode, ErrorSeverity, Result};
    pub use crate::rbac::{permissions, Permission, PredefinedRole, RbacGate};
    pub use crate::session::{Session, SessionProvider};
    pub use crate::validation::{Validate, ValidationErrors, ValidationResult};
}
