//! Sign-in, identity provider callback and sign-out.
//!
//! Tokens are issued by the identity provider. The portal only validates
//! the token it is handed, stores it in the `HttpOnly` session cookie and
//! clears that cookie again on sign-out.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use super::{alert, escape, layout};
use crate::api::AppState;
use crate::context::RequestContext;
use crate::error::{ActionFailure, EdforgeError};
use crate::session::{SessionCookie, SIGN_IN_PATH};

/// Where to land when no usable callback was given.
pub const DEFAULT_LANDING: &str = "/dashboard";

#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub token: Option<String>,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Keep only same-site relative paths. Anything else (absolute URLs,
/// protocol-relative `//host`, backslash tricks) lands on the dashboard.
pub fn safe_callback(target: Option<&str>) -> String {
    match target.map(str::trim) {
        Some(t)
            if t.starts_with('/')
                && !t.starts_with("//")
                && !t.starts_with("/\\")
                && !t.chars().any(|c| c.is_control()) =>
        {
            t.to_string()
        }
        _ => DEFAULT_LANDING.to_string(),
    }
}

/// `GET /auth/signin`
pub async fn sign_in(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<SignInQuery>,
) -> Response {
    let target = safe_callback(query.callback_url.as_deref());
    if ctx.is_authenticated() {
        return Redirect::to(&target).into_response();
    }
    Html(sign_in_page(&state, &target, None)).into_response()
}

/// `GET /auth/callback?token=...&callbackUrl=...`
pub async fn callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    let target = safe_callback(query.callback_url.as_deref());
    let token = query.token.as_deref().map(str::trim).unwrap_or_default();

    let session = if token.is_empty() {
        Err(EdforgeError::unauthorized("Sign-in did not return a token"))
    } else {
        state.sessions.resolve(token)
    };

    match session {
        Ok(session) => {
            info!(
                user_id = %session.user_id,
                tenant_id = %session.tenant_id,
                role = %session.role,
                "Signed in"
            );
            let cookie = SessionCookie::new(
                state.config.auth.cookie_name.as_str(),
                token,
                session.remaining_secs(),
                state.config.auth.cookie_secure,
            );
            (
                [(header::SET_COOKIE, cookie.to_header_value())],
                Redirect::to(&target),
            )
                .into_response()
        }
        Err(error) => {
            warn!(error_code = %error.code(), "Rejected sign-in token");
            let failure = ActionFailure::from(error);
            (
                StatusCode::UNAUTHORIZED,
                Html(sign_in_page(&state, &target, Some(&failure))),
            )
                .into_response()
        }
    }
}

/// `POST /auth/signout`
pub async fn sign_out(State(state): State<AppState>, ctx: RequestContext) -> Response {
    if let Some(session) = ctx.session() {
        info!(user_id = %session.user_id, "Signed out");
    }
    let cookie = SessionCookie::clear(
        state.config.auth.cookie_name.as_str(),
        state.config.auth.cookie_secure,
    );
    (
        [(header::SET_COOKIE, cookie.to_header_value())],
        Redirect::to(SIGN_IN_PATH),
    )
        .into_response()
}

/// Identity provider link, carrying where to come back to.
fn provider_link(state: &AppState, target: &str) -> Option<String> {
    let provider = state.config.auth.sign_in_url.as_deref()?;
    let public_url = state
        .config
        .server
        .public_url
        .as_deref()
        .unwrap_or_default()
        .trim_end_matches('/');
    let return_to = format!(
        "{}/auth/callback?callbackUrl={}",
        public_url,
        urlencoding::encode(target)
    );
    let separator = if provider.contains('?') { '&' } else { '?' };
    Some(format!(
        "{}{}redirect_uri={}",
        provider,
        separator,
        urlencoding::encode(&return_to)
    ))
}

fn sign_in_page(state: &AppState, target: &str, failure: Option<&ActionFailure>) -> String {
    let action = match provider_link(state, target) {
        Some(href) => format!(
            r#"<p><a class="button" href="{}">Continue to sign in</a></p>"#,
            escape(&href)
        ),
        None => "<p>No identity provider is configured for this portal.</p>".to_string(),
    };
    let body = format!(
        r#"<div class="centered"><h1>Sign in to EdForge</h1>{}<p>Sign in with your school account to continue.</p>{}</div>"#,
        failure.map(alert).unwrap_or_default(),
        action,
    );
    layout::document("Sign in", &body, false)
}
