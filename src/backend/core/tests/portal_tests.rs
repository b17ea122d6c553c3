//! End-to-end tests for the portal router.
//!
//! Tests cover:
//! - Sign-in redirects for anonymous dashboard requests
//! - RBAC denial before any backend call
//! - Bearer token relay to the gateway
//! - Route availability redirects
//! - Theme bootstrap ordering in rendered pages
//! - Create-then-list round trip against an in-process backend
//! - Health check and sign-in callback cookie

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edforge_core::actions::{school, ActionContext};
use edforge_core::api::{build_router, AppState};
use edforge_core::client::ApiClient;
use edforge_core::config::{Config, EvaluatorKind};
use edforge_core::context::RequestContext;
use edforge_core::domain::CreateSchoolRequest;
use edforge_core::error::{EdforgeError, ErrorCode, Result};
use edforge_core::pages::theme::BOOTSTRAP_SCRIPT;
use edforge_core::rbac::{RbacGate, RoleId, TenantId, UserId};
use edforge_core::session::{AccessToken, Session, SessionProvider};

// ============================================================================
// Fixtures
// ============================================================================

/// Accepts `<role>-token` and signs in as that role.
struct RoleTokenProvider;

impl SessionProvider for RoleTokenProvider {
    fn resolve(&self, token: &str) -> Result<Session> {
        let role = token
            .strip_suffix("-token")
            .ok_or_else(|| EdforgeError::new(ErrorCode::InvalidToken, "Invalid token"))?;
        Ok(session(role, token))
    }
}

fn session(role: &str, token: &str) -> Session {
    Session {
        user_id: UserId::new("u-1"),
        tenant_id: TenantId::new("t-1"),
        role: RoleId::new(role),
        email: Some("ada@school.edu".to_string()),
        name: Some("Ada Lovelace".to_string()),
        access_token: AccessToken::new(token),
        expires_at: Utc::now() + Duration::minutes(30),
    }
}

fn config(gateway: &str, evaluator: EvaluatorKind) -> Config {
    let mut config = Config::with_gateway(gateway);
    config.rbac.evaluator = evaluator;
    config
}

fn app(config: Config) -> Router {
    let state = AppState::with_session_provider(config, Arc::new(RoleTokenProvider), None)
        .expect("state");
    build_router(state)
}

fn get_as(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("edforge_session={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, token: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("edforge_session={}", token))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// ============================================================================
// Page Guard
// ============================================================================

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(get_as("/dashboard/schools?page=2", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/auth/signin?callbackUrl=%2Fdashboard%2Fschools%3Fpage%3D2"
    );
}

#[tokio::test]
async fn test_invalid_cookie_is_anonymous() {
    let server = MockServer::start().await;
    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(get_as("/dashboard", Some("garbage")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/signin"));
}

#[tokio::test]
async fn test_student_denied_users_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(config(&server.uri(), EvaluatorKind::RolePolicy))
        .oneshot(get_as("/dashboard/admin/users", Some("student-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("user:read"));
}

#[tokio::test]
async fn test_student_cannot_create_school() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/schools"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "s1"})))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(config(&server.uri(), EvaluatorKind::RolePolicy))
        .oneshot(post_form("/dashboard/schools", "student-token", "name=North+High"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let html = body_text(response).await;
    assert!(html.contains("You do not have permission to perform this action."));
    // Student lacks school:create, so no create form either.
    assert!(!html.contains("Add school"));
}

#[tokio::test]
async fn test_user_detail_redirects_to_list() {
    let server = MockServer::start().await;
    let app = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated));

    for uri in ["/dashboard/admin/users/42", "/dashboard/admin/users/u-9/edit"] {
        let response = app
            .clone()
            .oneshot(get_as(uri, Some("tenant_admin-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{}", uri);
        assert_eq!(location(&response), "/dashboard/admin/users");
    }
}

#[tokio::test]
async fn test_user_edit_post_lands_on_list_as_get() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "u-5"})))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(post_form(
            "/dashboard/admin/users/5/edit",
            "tenant_admin-token",
            "first_name=Ada",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/admin/users");
}

// ============================================================================
// Relay
// ============================================================================

#[tokio::test]
async fn test_signed_in_page_relays_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schools"))
        .and(header_eq("authorization", "Bearer teacher-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "s1", "name": "North High", "code": "NH"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(get_as("/dashboard/schools", Some("teacher-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("North High"));
    assert!(html.contains("Ada Lovelace"));
    assert!(!html.contains("teacher-token"));
}

#[tokio::test]
async fn test_backend_unauthorized_sends_back_to_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/classrooms"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&server)
        .await;

    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(get_as("/dashboard/classrooms", Some("teacher-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/auth/signin?callbackUrl=%2Fdashboard%2Fclassrooms"
    );
}

#[tokio::test]
async fn test_theme_script_first_in_rendered_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(get_as("/dashboard/schools", Some("teacher-token")))
        .await
        .unwrap();

    let csp = response
        .headers()
        .get("content-security-policy")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(csp.contains("'sha256-"));

    let html = body_text(response).await;
    let script = html.find(BOOTSTRAP_SCRIPT).unwrap();
    assert!(script < html.find("<style>").unwrap());
    assert!(script < html.find("<title>").unwrap());
}

// ============================================================================
// Round Trip
// ============================================================================

type Store = Arc<Mutex<Vec<Value>>>;

async fn list_schools(State(store): State<Store>) -> Json<Value> {
    let schools = store.lock().unwrap().clone();
    Json(json!({ "data": schools }))
}

async fn create_school(State(store): State<Store>, Json(mut body): Json<Value>) -> Response {
    let mut schools = store.lock().unwrap();
    body["id"] = json!(format!("s{}", schools.len() + 1));
    schools.push(body.clone());
    (StatusCode::CREATED, Json(json!({ "data": body }))).into_response()
}

/// A tiny schools service on an ephemeral port.
async fn spawn_backend() -> String {
    let store: Store = Arc::default();
    let backend = Router::new()
        .route("/schools", get(list_schools).post(create_school))
        .with_state(store);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, backend).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_create_then_list_round_trip() {
    let base_url = spawn_backend().await;
    let config = config(&base_url, EvaluatorKind::RolePolicy);
    let client = ApiClient::new(&config.gateway).unwrap();
    let gate = RbacGate::from_config(&config.rbac);
    let ctx = RequestContext::new(Some(session("school_admin", "school_admin-token")));
    let actions = ActionContext::new(&ctx, &client, &gate);

    let request = CreateSchoolRequest {
        name: "North High".to_string(),
        code: Some("NH".to_string()),
        email: Some("office@north.edu".to_string()),
        ..Default::default()
    };
    let created = school::create_school_action(actions, &request)
        .await
        .unwrap()
        .expect("backend returns the stored school");
    assert_eq!(created.id, "s1");

    let schools = school::get_schools_action(actions).await.unwrap();
    assert_eq!(schools.len(), 1);
    assert_eq!(schools[0].name, "North High");
    assert_eq!(schools[0].code.as_deref(), Some("NH"));
    assert_eq!(schools[0].email.as_deref(), Some("office@north.edu"));
}

#[tokio::test]
async fn test_create_form_posts_then_redirects() {
    let base_url = spawn_backend().await;
    let app = app(config(&base_url, EvaluatorKind::RolePolicy));

    let response = app
        .clone()
        .oneshot(post_form(
            "/dashboard/schools",
            "school_admin-token",
            "name=South+Elementary&code=SE&principal_name=Grace+Hopper",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/schools?notice=created");

    let response = app
        .oneshot(get_as("/dashboard/schools?notice=created", Some("school_admin-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("South Elementary"));
    assert!(html.contains("Grace Hopper"));
    assert!(html.contains("Saved."));
}

#[tokio::test]
async fn test_invalid_form_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(config(&server.uri(), EvaluatorKind::RolePolicy))
        .oneshot(post_form("/dashboard/schools", "school_admin-token", "name="))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Name is required"));
}

// ============================================================================
// Operational + Auth
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    let response = app(config(&server.uri(), EvaluatorKind::RolePolicy))
        .oneshot(get_as("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["rbac_evaluator"], "role_policy");
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let server = MockServer::start().await;
    let response = app(config(&server.uri(), EvaluatorKind::RolePolicy))
        .oneshot(get_as("/metrics", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_callback_sets_http_only_cookie() {
    let server = MockServer::start().await;
    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(get_as(
            "/auth/callback?token=teacher-token&callbackUrl=%2Fdashboard%2Fgrades",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/grades");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("edforge_session=teacher-token"));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_callback_rejects_bad_token() {
    let server = MockServer::start().await;
    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(get_as("/auth/callback?token=nope", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_sign_out_clears_cookie() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/auth/signout")
        .header(header::COOKIE, "edforge_session=teacher-token")
        .body(Body::empty())
        .unwrap();
    let response = app(config(&server.uri(), EvaluatorKind::AllowAuthenticated))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/signin");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.contains("Max-Age=0"));
}
