//! Configuration management.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{EdforgeError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Backend API gateway the relay talks to
    pub gateway: GatewayConfig,

    /// Session token validation and cookie settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Permission evaluator selection
    #[serde(default)]
    pub rbac: RbacConfig,

    /// Route availability overrides
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Logging, tracing and metrics
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible URL, used for identity provider callbacks
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL every backend path is joined onto
    pub base_url: String,

    /// Whole-request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for HS* tokens
    pub jwt_secret: Option<String>,

    /// PEM public key for RS*/ES* tokens
    pub jwt_public_key: Option<String>,

    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,

    /// Expected `iss` claim
    pub issuer: Option<String>,

    /// Expected `aud` claim
    pub audience: Option<String>,

    /// Clock skew tolerance for `nbf` and `iat`. A session still ends at
    /// `exp` exactly.
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,

    /// Hosted login page of the identity provider
    pub sign_in_url: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_public_key: None,
            jwt_algorithm: default_jwt_algorithm(),
            issuer: None,
            audience: None,
            leeway_secs: default_leeway_secs(),
            cookie_name: default_cookie_name(),
            cookie_secure: default_cookie_secure(),
            sign_in_url: None,
        }
    }
}

/// Which [`PermissionEvaluator`](crate::rbac::PermissionEvaluator) backs the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    #[default]
    AllowAuthenticated,
    RolePolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RbacConfig {
    #[serde(default)]
    pub evaluator: EvaluatorKind,
}

/// A route pattern whose page the backend cannot serve.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnsupportedRoute {
    pub pattern: String,
    pub fallback: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_unsupported_routes")]
    pub unsupported: Vec<UnsupportedRoute>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            unsupported: default_unsupported_routes(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Log level or full `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// OpenTelemetry OTLP endpoint
    pub otlp_endpoint: Option<String>,

    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            otlp_endpoint: None,
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> Duration { Duration::from_secs(30) }
fn default_connect_timeout() -> Duration { Duration::from_secs(5) }
fn default_user_agent() -> String { format!("edforge-portal/{}", env!("CARGO_PKG_VERSION")) }
fn default_jwt_algorithm() -> String { "HS256".to_string() }
fn default_leeway_secs() -> u64 { 60 }
fn default_cookie_name() -> String { "edforge_session".to_string() }
fn default_cookie_secure() -> bool { true }
fn default_service_name() -> String { "edforge-portal".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_metrics_enabled() -> bool { true }

fn default_unsupported_routes() -> Vec<UnsupportedRoute> {
    vec![
        UnsupportedRoute {
            pattern: "/dashboard/admin/users/:user_id".to_string(),
            fallback: "/dashboard/admin/users".to_string(),
        },
        UnsupportedRoute {
            pattern: "/dashboard/admin/users/:user_id/edit".to_string(),
            fallback: "/dashboard/admin/users".to_string(),
        },
    ]
}

const ENV_PREFIX: &str = "EDFORGE";

impl Config {
    /// Load configuration from environment variables (`EDFORGE__GATEWAY__BASE_URL`, ...).
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with the environment layered on top.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults everywhere except the gateway address.
    pub fn with_gateway(base_url: impl Into<String>) -> Self {
        Self {
            server: ServerConfig::default(),
            gateway: GatewayConfig::new(base_url),
            auth: AuthConfig::default(),
            rbac: RbacConfig::default(),
            routes: RoutesConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let base = self.gateway.base_url.trim();
        if base.is_empty() {
            return Err(EdforgeError::configuration("gateway.base_url must be set"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(EdforgeError::configuration(format!(
                "gateway.base_url must be an http(s) URL, got {}",
                base
            )));
        }

        if self.auth.jwt_secret.is_none() && self.auth.jwt_public_key.is_none() {
            return Err(EdforgeError::configuration(
                "auth.jwt_secret or auth.jwt_public_key must be set",
            ));
        }

        for route in &self.routes.unsupported {
            if !route.pattern.starts_with('/') || !route.fallback.starts_with('/') {
                return Err(EdforgeError::configuration(format!(
                    "route pattern and fallback must be absolute paths: {} -> {}",
                    route.pattern, route.fallback
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Write;

    fn valid() -> Config {
        let mut cfg = Config::with_gateway("http://gateway.local/api");
        cfg.auth.jwt_secret = Some("secret".to_string());
        cfg
    }

    #[test]
    fn test_defaults() {
        let cfg = valid();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.gateway.timeout, Duration::from_secs(30));
        assert_eq!(cfg.auth.cookie_name, "edforge_session");
        assert_eq!(cfg.rbac.evaluator, EvaluatorKind::AllowAuthenticated);
        assert_eq!(cfg.routes.unsupported.len(), 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_missing_signing_key_rejected() {
        let mut cfg = valid();
        cfg.auth.jwt_secret = None;
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigurationError);
    }

    #[test]
    fn test_non_http_gateway_rejected() {
        let mut cfg = valid();
        cfg.gateway.base_url = "gateway.local".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[gateway]
base_url = "https://api.edforge.test"
timeout = "10s"

[auth]
jwt_secret = "file-secret"

[rbac]
evaluator = "role_policy"

[telemetry]
log_format = "pretty"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.gateway.base_url, "https://api.edforge.test");
        assert_eq!(cfg.gateway.timeout, Duration::from_secs(10));
        assert_eq!(cfg.gateway.connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.rbac.evaluator, EvaluatorKind::RolePolicy);
        assert_eq!(cfg.telemetry.log_format, LogFormat::Pretty);
        assert_eq!(cfg.routes.unsupported[0].fallback, "/dashboard/admin/users");
    }
}
