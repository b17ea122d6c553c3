//! Per-request context.
//!
//! [`SessionLayer`] resolves the session once per request and stores a
//! [`RequestContext`] in the request extensions. Pages and actions receive the
//! context explicitly; nothing about a user outlives the request.
//!
//! # Example
//!
//! ```rust,ignore
//! use edforge_core::context::{RequestContext, SessionLayer};
//!
//! let app = Router::new()
//!     .route("/dashboard", get(|ctx: RequestContext| async move { ... }))
//!     .layer(SessionLayer::new(provider, "edforge_session"));
//! ```

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderValue},
    response::Response,
};
use futures::future::BoxFuture;
use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::debug;
use uuid::Uuid;

use crate::session::{extract_session_token, Session, SessionProvider};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Everything an action or client call needs to know about the caller.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub session: Option<Session>,
}

impl RequestContext {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            session,
        }
    }

    /// A context with no signed-in user.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_expired())
    }
}

/// Extractor for the request context in handlers.
///
/// Falls back to an anonymous context when [`SessionLayer`] is not applied.
#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::anonymous))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Session resolution layer.
#[derive(Clone)]
pub struct SessionLayer {
    provider: Arc<dyn SessionProvider>,
    cookie_name: Arc<str>,
}

impl SessionLayer {
    pub fn new(provider: Arc<dyn SessionProvider>, cookie_name: impl Into<String>) -> Self {
        Self {
            provider,
            cookie_name: Arc::from(cookie_name.into()),
        }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            provider: self.provider.clone(),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

/// Session resolution service.
#[derive(Clone)]
pub struct SessionService<S> {
    inner: S,
    provider: Arc<dyn SessionProvider>,
    cookie_name: Arc<str>,
}

impl<S> Service<Request<Body>> for SessionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let provider = self.provider.clone();
        let cookie_name = self.cookie_name.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|s| !s.is_empty() && s.len() <= 128)
                .map(|s| s.to_string())
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            let session = extract_session_token(request.headers(), &cookie_name).and_then(
                |token| match provider.resolve(&token) {
                    Ok(session) => Some(session),
                    Err(e) => {
                        debug!(request_id = %request_id, error_code = %e.code(), "No usable session");
                        None
                    }
                },
            );

            request.extensions_mut().insert(RequestContext {
                request_id: request_id.clone(),
                session,
            });

            let mut response = inner.call(request).await?;
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EdforgeError, Result};
    use crate::rbac::{RoleId, TenantId, UserId};
    use crate::session::AccessToken;
    use axum::{routing::get, Router};
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    struct FixedProvider;

    impl SessionProvider for FixedProvider {
        fn resolve(&self, token: &str) -> Result<Session> {
            if token != "good" {
                return Err(EdforgeError::new(crate::error::ErrorCode::InvalidToken, "bad"));
            }
            Ok(Session {
                user_id: UserId::new("u-1"),
                tenant_id: TenantId::new("t-1"),
                role: RoleId::new("teacher"),
                email: None,
                name: None,
                access_token: AccessToken::new(token),
                expires_at: Utc::now() + Duration::minutes(5),
            })
        }
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|ctx: RequestContext| async move {
                    match ctx.session() {
                        Some(s) => s.user_id.to_string(),
                        None => "anonymous".to_string(),
                    }
                }),
            )
            .layer(SessionLayer::new(Arc::new(FixedProvider), "edforge_session"))
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_cookie_session() {
        let request = Request::builder()
            .uri("/")
            .header("cookie", "edforge_session=good")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body_of(response).await, "u-1");
    }

    #[tokio::test]
    async fn test_invalid_token_is_anonymous() {
        let request = Request::builder()
            .uri("/")
            .header("authorization", "Bearer forged")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(body_of(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "req-42");
    }
}
