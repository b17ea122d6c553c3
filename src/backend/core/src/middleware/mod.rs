//! Cross-cutting HTTP middleware for the portal.
pub mod security_headers;

pub use security_headers::{content_security_policy, SecurityHeadersLayer, SecurityHeadersConfig, FrameOptions, ReferrerPolicy};
