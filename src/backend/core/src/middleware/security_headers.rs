//! Security headers middleware.
//!
//! The CSP allows inline scripts only by hash, so the theme bootstrap script
//! runs while any injected markup cannot.
use axum::{extract::Request, http::{HeaderName, HeaderValue}, response::Response};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::context::REQUEST_ID_HEADER;
use crate::pages::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameOptions { #[default] Deny, SameOrigin }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferrerPolicy { NoReferrer, SameOrigin, #[default] StrictOriginWhenCrossOrigin }
impl std::fmt::Display for ReferrerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoReferrer => write!(f, "no-referrer"), Self::SameOrigin => write!(f, "same-origin"),
            Self::StrictOriginWhenCrossOrigin => write!(f, "strict-origin-when-cross-origin"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    pub frame_options: FrameOptions, pub referrer_policy: ReferrerPolicy,
    /// Off for plain-http development setups.
    pub hsts_enabled: bool, pub hsts_max_age: u64, pub hsts_include_subdomains: bool,
    pub permissions_policy: String,
    /// Path prefixes whose responses must never be cached (pages carry personal data).
    pub no_store_prefixes: Vec<String>,
}
impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self { frame_options: FrameOptions::Deny, referrer_policy: ReferrerPolicy::StrictOriginWhenCrossOrigin,
            hsts_enabled: true, hsts_max_age: 31_536_000, hsts_include_subdomains: true,
            permissions_policy: "camera=(), microphone=(), geolocation=(), payment=()".into(),
            no_store_prefixes: vec!["/dashboard".into(), "/auth".into()],
        }
    }
}

/// Content-Security-Policy admitting the layout's inline scripts by hash.
pub fn content_security_policy() -> String {
    format!("default-src 'self'; script-src 'self' {}; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'", theme::inline_script_hashes())
}

#[derive(Debug, Clone)]
pub struct SecurityHeadersLayer { config: SecurityHeadersConfig, csp: HeaderValue }
impl SecurityHeadersLayer {
    pub fn new(config: SecurityHeadersConfig) -> Self {
        // Hashes are base64, so the policy is always a valid header value.
        let csp = HeaderValue::from_str(&content_security_policy()).unwrap_or_else(|_| HeaderValue::from_static("default-src 'self'"));
        Self { config, csp }
    }
}
impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;
    fn layer(&self, inner: S) -> Self::Service { SecurityHeadersService { inner, config: self.config.clone(), csp: self.csp.clone() } }
}

#[derive(Debug, Clone)]
pub struct SecurityHeadersService<S> { inner: S, config: SecurityHeadersConfig, csp: HeaderValue }
impl<S> Service<Request> for SecurityHeadersService<S>
where S: Service<Request, Response = Response> + Clone + Send + 'static, S::Future: Send + 'static, {
    type Response = Response; type Error = S::Error; type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> { self.inner.poll_ready(cx) }
    fn call(&mut self, mut req: Request) -> Self::Future {
        let config = self.config.clone(); let csp = self.csp.clone(); let mut inner = self.inner.clone();
        let request_id = req.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()).filter(|s| !s.is_empty() && s.len() <= 128).map(|s| s.to_string()).unwrap_or_else(|| Uuid::new_v4().to_string());
        if let Ok(val) = HeaderValue::from_str(&request_id) { req.headers_mut().insert(HeaderName::from_static(REQUEST_ID_HEADER), val); }
        let path = req.uri().path().to_string();
        let no_store = config.no_store_prefixes.iter().any(|p| path == *p || path.starts_with(&format!("{}/", p)));
        Box::pin(async move {
            let mut response = inner.call(req).await?; let headers = response.headers_mut();
            headers.insert(HeaderName::from_static("x-content-type-options"), HeaderValue::from_static("nosniff"));
            headers.insert(HeaderName::from_static("x-frame-options"), HeaderValue::from_static(match config.frame_options { FrameOptions::Deny => "DENY", FrameOptions::SameOrigin => "SAMEORIGIN" }));
            if config.hsts_enabled {
                let mut hsts = format!("max-age={}", config.hsts_max_age);
                if config.hsts_include_subdomains { hsts.push_str("; includeSubDomains"); }
                if let Ok(v) = HeaderValue::from_str(&hsts) { headers.insert(HeaderName::from_static("strict-transport-security"), v); }
            }
            headers.insert(HeaderName::from_static("content-security-policy"), csp);
            if let Ok(v) = HeaderValue::from_str(&config.referrer_policy.to_string()) { headers.insert(HeaderName::from_static("referrer-policy"), v); }
            if !config.permissions_policy.is_empty() { if let Ok(v) = HeaderValue::from_str(&config.permissions_policy) { headers.insert(HeaderName::from_static("permissions-policy"), v); } }
            if let Ok(v) = HeaderValue::from_str(&request_id) { headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), v); }
            headers.remove("server");
            if no_store { headers.insert(HeaderName::from_static("cache-control"), HeaderValue::from_static("no-store, private")); }
            Ok(response)
        })
    }
}
