//! HTTP surface of the portal.
//!
//! One router serves everything:
//!
//! - `/health` and `/metrics` (unauthenticated)
//! - `/auth/*` sign-in, callback and sign-out
//! - `/dashboard/*` pages, behind the page guard
//!
//! # Layer order (outermost first)
//!
//! 1. `CatchPanicLayer`: a panicking handler becomes the 500 page
//! 2. `SecurityHeadersLayer`
//! 3. `TraceLayer`, `CompressionLayer`
//! 4. `SessionLayer`: resolves the session into a `RequestContext`
//! 5. `PageGuardLayer` (dashboard routes only)

mod handlers;

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer,
};
use tracing::{error, Span};

use crate::actions::ActionContext;
use crate::client::ApiClient;
use crate::config::Config;
use crate::context::{RequestContext, SessionLayer};
use crate::error::Result;
use crate::middleware::{SecurityHeadersConfig, SecurityHeadersLayer};
use crate::pages::{self, layout, RouteAvailability};
use crate::rbac::{PageGuardLayer, RbacGate};
use crate::session::{JwtSessionProvider, SessionProvider};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: ApiClient,
    pub gate: RbacGate,
    pub availability: Arc<RouteAvailability>,
    pub sessions: Arc<dyn SessionProvider>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire everything from configuration, validating JWT keys.
    pub fn new(config: Config, metrics: Option<PrometheusHandle>) -> Result<Self> {
        let sessions = Arc::new(JwtSessionProvider::new(&config.auth)?);
        Self::with_session_provider(config, sessions, metrics)
    }

    /// Same as [`new`](Self::new) with a caller-supplied session provider.
    pub fn with_session_provider(
        config: Config,
        sessions: Arc<dyn SessionProvider>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(&config.gateway)?,
            gate: RbacGate::from_config(&config.rbac),
            availability: Arc::new(RouteAvailability::from_config(&config.routes)),
            config: Arc::new(config),
            sessions,
            metrics,
        })
    }

    /// Action context for one request.
    pub fn actions<'a>(&'a self, ctx: &'a RequestContext) -> ActionContext<'a> {
        ActionContext::new(ctx, &self.client, &self.gate)
    }
}

/// Build the router.
///
/// # Example
///
/// ```rust,ignore
/// let state = AppState::new(config, Some(prometheus))?;
/// let app = build_router(state);
/// axum::serve(listener, app).await?;
/// ```
pub fn build_router(state: AppState) -> Router {
    let dashboard = pages::dashboard_routes().layer(PageGuardLayer::new(
        state.gate.clone(),
        state.availability.clone(),
        pages::required_permission,
    ));

    let session_layer = SessionLayer::new(
        state.sessions.clone(),
        state.config.auth.cookie_name.clone(),
    );
    let security = SecurityHeadersLayer::new(SecurityHeadersConfig {
        hsts_enabled: state.config.auth.cookie_secure,
        ..Default::default()
    });

    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/auth/signin", get(pages::auth::sign_in))
        .route("/auth/callback", get(pages::auth::callback))
        .route("/auth/signout", axum::routing::post(pages::auth::sign_out))
        .merge(dashboard)
        .fallback(not_found)
        .layer(session_layer)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(security)
        .layer(CatchPanicLayer::custom(panic_page))
        .with_state(state)
}

/// Records the path only. The sign-in callback carries the session token
/// in its query string.
fn request_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html(layout::error_page(StatusCode::NOT_FOUND, "This page does not exist.")),
    )
}

fn panic_page(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Handler panicked");

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (
        status,
        Html(layout::error_page(
            status,
            "Something went wrong on our side. Please try again later.",
        )),
    )
        .into_response()
}
