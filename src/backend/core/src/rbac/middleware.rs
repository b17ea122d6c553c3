//! Page guard enforcing sign-in, route availability, and RBAC on dashboard pages.
//!
//! Reads the [`RequestContext`] injected by the session layer and decides,
//! before any handler runs (and so before any backend call), whether the
//! request may proceed:
//!
//! 1. no session: 303 to the sign-in page, remembering the requested path
//! 2. unsupported route: redirect to the route's fallback (see
//!    [`fallback_redirect`])
//! 3. permission denied: 403 deny page

use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info, warn};

use super::gate::RbacGate;
use super::models::Permission;
use crate::context::RequestContext;
use crate::pages::availability::{Availability, RouteAvailability};
use crate::pages::layout;
use crate::session::SIGN_IN_PATH;
use crate::telemetry::{RedirectReason, RouteMetrics};

/// Resolves the permission a page path requires.
pub type PermissionResolver = fn(&str) -> Permission;

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer that wraps page routes with the guard.
///
/// # Example
///
/// ```rust,ignore
/// let dashboard = Router::new()
///     .route("/dashboard/schools", get(schools_page))
///     .layer(PageGuardLayer::new(gate, availability, pages::required_permission));
/// ```
#[derive(Clone)]
pub struct PageGuardLayer {
    gate: RbacGate,
    availability: Arc<RouteAvailability>,
    resolve: PermissionResolver,
}

impl PageGuardLayer {
    pub fn new(gate: RbacGate, availability: Arc<RouteAvailability>, resolve: PermissionResolver) -> Self {
        Self {
            gate,
            availability,
            resolve,
        }
    }
}

impl<S> Layer<S> for PageGuardLayer {
    type Service = PageGuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PageGuardService {
            inner,
            gate: self.gate.clone(),
            availability: self.availability.clone(),
            resolve: self.resolve,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Service
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PageGuardService<S> {
    inner: S,
    gate: RbacGate,
    availability: Arc<RouteAvailability>,
    resolve: PermissionResolver,
}

impl<S> Service<Request<Body>> for PageGuardService<S>
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

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let gate = self.gate.clone();
        let availability = self.availability.clone();
        let resolve = self.resolve;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let ctx = request
                .extensions()
                .get::<RequestContext>()
                .cloned()
                .unwrap_or_else(RequestContext::anonymous);
            let path = request.uri().path().to_string();

            if !ctx.is_authenticated() {
                let target = request
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| path.clone());
                RouteMetrics::record_redirect(RedirectReason::SignIn);
                info!(request_id = %ctx.request_id, path = %path, "Redirecting to sign-in");
                return Ok(Redirect::to(&sign_in_url(&target)).into_response());
            }

            if let Availability::Unsupported { fallback } = availability.lookup(&path) {
                RouteMetrics::record_redirect(RedirectReason::Unsupported);
                info!(
                    request_id = %ctx.request_id,
                    path = %path,
                    fallback = %fallback,
                    "Route not supported by backend, redirecting"
                );
                return Ok(fallback_redirect(request.method(), &fallback));
            }

            let permission = resolve(&path);
            if !gate.has_permission(ctx.session(), &permission) {
                warn!(
                    request_id = %ctx.request_id,
                    path = %path,
                    permission = %permission,
                    "Page access denied"
                );
                return Ok(deny_response(&ctx, &permission));
            }

            inner.call(request).await
        })
    }
}

/// 307 for GET and HEAD. Any other method gets a 303 so the fallback
/// page is fetched with GET and the form body is not resubmitted.
pub fn fallback_redirect(method: &Method, target: &str) -> Response {
    if method == Method::GET || method == Method::HEAD {
        Redirect::temporary(target).into_response()
    } else {
        Redirect::to(target).into_response()
    }
}

/// Sign-in URL that returns to `target` afterwards.
pub fn sign_in_url(target: &str) -> String {
    format!("{}?callbackUrl={}", SIGN_IN_PATH, urlencoding::encode(target))
}

fn deny_response(ctx: &RequestContext, permission: &Permission) -> Response {
    (
        StatusCode::FORBIDDEN,
        Html(layout::deny_page(ctx, permission)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_url_encodes_target() {
        assert_eq!(
            sign_in_url("/dashboard/schools?page=2"),
            "/auth/signin?callbackUrl=%2Fdashboard%2Fschools%3Fpage%3D2"
        );
    }

    #[test]
    fn test_fallback_redirect_status_follows_method() {
        let cases = [
            (Method::GET, StatusCode::TEMPORARY_REDIRECT),
            (Method::HEAD, StatusCode::TEMPORARY_REDIRECT),
            (Method::POST, StatusCode::SEE_OTHER),
            (Method::DELETE, StatusCode::SEE_OTHER),
        ];
        for (method, status) in cases {
            let response = fallback_redirect(&method, "/dashboard/classrooms");
            assert_eq!(response.status(), status, "{}", method);
            assert_eq!(
                response.headers().get(axum::http::header::LOCATION).unwrap(),
                "/dashboard/classrooms"
            );
        }
    }
}
