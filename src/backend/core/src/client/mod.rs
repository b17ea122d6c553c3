//! HTTP client for the backend API gateway.
//!
//! Every server action goes through [`ApiClient::request`]. The client owns a
//! credential-free connection pool; the bearer token is taken from the
//! [`RequestContext`] of the call and never stored.

pub mod endpoints;

use std::time::Instant;

use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{field, info_span, warn, Instrument};

use crate::config::GatewayConfig;
use crate::context::{RequestContext, REQUEST_ID_HEADER};
use crate::error::{EdforgeError, ErrorCode, ErrorDetails, Result};
use crate::telemetry::logging::{sanitize_body, truncate_chars};
use crate::telemetry::BackendMetrics;

/// Longest backend message surfaced in a `ValidationFailed` error.
const MAX_MESSAGE_CHARS: usize = 300;

/// HTTP client for the backend gateway.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the configured gateway.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                EdforgeError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    /// Return the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a backend path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one request to the backend and decode the JSON response.
    ///
    /// The bearer token is attached only when `ctx` carries a session. An
    /// empty 2xx body decodes as JSON `null`.
    pub async fn request<B, T>(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let span = info_span!(
            "backend_request",
            method = %method,
            path = %path,
            request_id = %ctx.request_id,
            status = field::Empty,
            elapsed_ms = field::Empty,
        );

        async move {
            let started = Instant::now();

            let mut builder = self
                .client
                .request(method.clone(), &url)
                .header(header::ACCEPT, "application/json")
                .header(REQUEST_ID_HEADER, ctx.request_id.as_str());

            if let Some(session) = ctx.session() {
                builder = builder.bearer_auth(session.access_token.expose());
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    BackendMetrics::record(method.as_str(), 0, started.elapsed());
                    tracing::Span::current()
                        .record("elapsed_ms", started.elapsed().as_millis() as u64);
                    let error = EdforgeError::from(e);
                    warn!(error_code = %error.code(), "Backend call failed");
                    return Err(error);
                }
            };

            let status = response.status().as_u16();
            let bytes = response.bytes().await?;
            let elapsed = started.elapsed();

            BackendMetrics::record(method.as_str(), status, elapsed);
            let span = tracing::Span::current();
            span.record("status", status);
            span.record("elapsed_ms", elapsed.as_millis() as u64);

            if !(200..300).contains(&status) {
                let text = String::from_utf8_lossy(&bytes);
                let error = classify_response(status, &text);
                warn!(
                    status = status,
                    error_code = %error.code(),
                    body = %sanitize_body(&text),
                    "Backend returned an error"
                );
                return Err(error);
            }

            decode_body(&bytes)
        }
        .instrument(span)
        .await
    }

    pub async fn get<T: DeserializeOwned>(&self, ctx: &RequestContext, path: &str) -> Result<T> {
        self.request::<(), T>(ctx, Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, ctx: &RequestContext, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ctx, Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, ctx: &RequestContext, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ctx, Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B, T>(&self, ctx: &RequestContext, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ctx, Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, ctx: &RequestContext, path: &str) -> Result<T> {
        self.request::<(), T>(ctx, Method::DELETE, path, None).await
    }
}

/// Decode a 2xx body. Blank bodies decode as `null`.
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let trimmed = bytes.trim_ascii();
    let source: &[u8] = if trimmed.is_empty() { b"null" } else { trimmed };
    serde_json::from_slice(source).map_err(EdforgeError::from)
}

/// Map a non-2xx status to an error class.
pub fn classify_status(status: u16) -> ErrorCode {
    match status {
        401 => ErrorCode::Unauthorized,
        403 => ErrorCode::Forbidden,
        404 => ErrorCode::NotFound,
        400 | 409 | 422 => ErrorCode::ValidationFailed,
        _ => ErrorCode::ServerError,
    }
}

/// Build the classified error for a non-2xx backend response.
pub fn classify_response(status: u16, body: &str) -> EdforgeError {
    let code = classify_status(status);
    let message = extract_backend_message(body)
        .map(|m| truncate_chars(&sanitize_body(&m), MAX_MESSAGE_CHARS))
        .unwrap_or_else(|| default_message(code).to_string());

    EdforgeError::new(code, message)
        .with_internal_message(format!("backend status {}: {}", status, sanitize_body(body)))
        .with_details(ErrorDetails::new().with_upstream_status(status))
}

fn default_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Unauthorized => "Authentication required",
        ErrorCode::Forbidden => "Access denied",
        ErrorCode::NotFound => "Not found",
        ErrorCode::ValidationFailed => "Invalid request",
        _ => "Backend request failed",
    }
}

/// Pull a human-readable message out of a backend error body.
///
/// Looks at `message` (a string or an array of strings), then `error`, then
/// `detail`. Non-JSON bodies fall back to the raw text.
pub fn extract_backend_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Some(truncate_chars(body, MAX_MESSAGE_CHARS));
    };

    for key in ["message", "error", "detail"] {
        match value.get(key) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                return Some(s.trim().to_string());
            }
            Some(serde_json::Value::Array(items)) => {
                let parts: Vec<&str> = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                if !parts.is_empty() {
                    return Some(parts.join("; "));
                }
            }
            // `{"error": {"message": "..."}}`
            Some(serde_json::Value::Object(inner)) => {
                if let Some(s) = inner.get("message").and_then(|m| m.as_str()) {
                    return Some(s.trim().to_string());
                }
            }
            _ => {}
        }
    }

    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}
