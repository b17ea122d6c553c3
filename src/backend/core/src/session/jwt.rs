//! JWT-backed session provider.

use std::str::FromStr;

use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use metrics::counter;
use serde::Deserialize;
use tracing::debug;

use super::{AccessToken, Session, SessionProvider};
use crate::config::AuthConfig;
use crate::error::{EdforgeError, ErrorCode, Result};
use crate::rbac::{RoleId, TenantId, UserId};

/// Claims read from the identity provider's access token.
///
/// Tenant and role accept both plain and Cognito-style custom claim names.
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    exp: i64,
    #[serde(default, alias = "custom:tenantId", alias = "tenantId")]
    tenant_id: Option<String>,
    #[serde(default, alias = "custom:userRole", alias = "userRole")]
    role: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Validates signed access tokens and maps their claims into a [`Session`].
pub struct JwtSessionProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionProvider {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm).map_err(|_| {
            EdforgeError::configuration(format!(
                "Unsupported JWT algorithm: {}",
                config.jwt_algorithm
            ))
        })?;

        let decoding_key = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                let secret = config.jwt_secret.as_ref().ok_or_else(|| {
                    EdforgeError::configuration("JWT secret required for HMAC algorithms")
                })?;
                DecodingKey::from_secret(secret.as_bytes())
            }
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
                let public_key = config.jwt_public_key.as_ref().ok_or_else(|| {
                    EdforgeError::configuration("JWT public key required for RSA algorithms")
                })?;
                DecodingKey::from_rsa_pem(public_key.as_bytes()).map_err(|e| {
                    EdforgeError::configuration(format!("Invalid RSA public key: {}", e))
                })?
            }
            Algorithm::ES256 | Algorithm::ES384 => {
                let public_key = config.jwt_public_key.as_ref().ok_or_else(|| {
                    EdforgeError::configuration("JWT public key required for EC algorithms")
                })?;
                DecodingKey::from_ec_pem(public_key.as_bytes()).map_err(|e| {
                    EdforgeError::configuration(format!("Invalid EC public key: {}", e))
                })?
            }
            other => {
                return Err(EdforgeError::configuration(format!(
                    "Unsupported JWT algorithm: {:?}",
                    other
                )));
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = config.leeway_secs;

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        match config.audience {
            Some(ref audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }
}

impl SessionProvider for JwtSessionProvider {
    fn resolve(&self, token: &str) -> Result<Session> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                debug!("Session token rejected: {}", e);
                counter!("edforge_session_rejections_total").increment(1);
                EdforgeError::from(e)
            },
        )?;
        let claims = data.claims;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| EdforgeError::new(ErrorCode::InvalidToken, "Invalid expiry"))?;
        // The decoder allows `leeway` past `exp`; the session does not.
        if expires_at <= Utc::now() {
            debug!("Session token rejected: expired at {}", expires_at);
            counter!("edforge_session_rejections_total").increment(1);
            return Err(EdforgeError::new(
                ErrorCode::SessionExpired,
                "Session has expired",
            ));
        }

        let tenant_id = claims
            .tenant_id
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EdforgeError::new(ErrorCode::InvalidToken, "Session has no tenant"))?;
        let role = claims
            .role
            .filter(|r| !r.is_empty())
            .ok_or_else(|| EdforgeError::new(ErrorCode::InvalidToken, "Session has no role"))?;

        Ok(Session {
            user_id: UserId::new(claims.sub),
            tenant_id: TenantId::new(tenant_id),
            role: RoleId::new(role),
            email: claims.email,
            name: claims.name,
            access_token: AccessToken::new(token),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn provider() -> JwtSessionProvider {
        let config = AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            ..AuthConfig::default()
        };
        JwtSessionProvider::new(&config).unwrap()
    }

    fn token(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_resolves_plain_claims() {
        let exp = Utc::now().timestamp() + 600;
        let raw = token(json!({
            "sub": "u-1",
            "exp": exp,
            "tenant_id": "t-1",
            "role": "teacher",
            "name": "Grace",
        }));

        let session = provider().resolve(&raw).unwrap();
        assert_eq!(session.user_id.as_str(), "u-1");
        assert_eq!(session.tenant_id.as_str(), "t-1");
        assert_eq!(session.role.as_str(), "teacher");
        assert_eq!(session.name.as_deref(), Some("Grace"));
        assert_eq!(session.access_token.expose(), raw);
        assert_eq!(session.expires_at.timestamp(), exp);
    }

    #[test]
    fn test_resolves_custom_claims() {
        let raw = token(json!({
            "sub": "u-2",
            "exp": Utc::now().timestamp() + 600,
            "custom:tenantId": "t-9",
            "custom:userRole": "school_admin",
        }));

        let session = provider().resolve(&raw).unwrap();
        assert_eq!(session.tenant_id.as_str(), "t-9");
        assert_eq!(session.role.as_str(), "school_admin");
    }

    #[test]
    fn test_expired_token_rejected() {
        let raw = token(json!({
            "sub": "u-1",
            "exp": Utc::now().timestamp() - 3600,
            "tenant_id": "t-1",
            "role": "teacher",
        }));

        let err = provider().resolve(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SessionExpired);
    }

    #[test]
    fn test_expired_within_leeway_rejected() {
        let config = AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            leeway_secs: 60,
            ..AuthConfig::default()
        };
        let provider = JwtSessionProvider::new(&config).unwrap();
        let raw = token(json!({
            "sub": "u-1",
            "exp": Utc::now().timestamp() - 20,
            "tenant_id": "t-1",
            "role": "teacher",
        }));

        let err = provider.resolve(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SessionExpired);
    }

    #[test]
    fn test_wrong_signature_rejected() {
        let raw = encode(
            &Header::default(),
            &json!({"sub": "u", "exp": Utc::now().timestamp() + 600, "tenant_id": "t", "role": "r"}),
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();

        let err = provider().resolve(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidToken);
    }

    #[test]
    fn test_missing_tenant_rejected() {
        let raw = token(json!({
            "sub": "u-1",
            "exp": Utc::now().timestamp() + 600,
            "role": "teacher",
        }));

        let err = provider().resolve(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidToken);
    }

    #[test]
    fn test_issuer_enforced() {
        let config = AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            issuer: Some("https://idp.edforge.test".to_string()),
            ..AuthConfig::default()
        };
        let provider = JwtSessionProvider::new(&config).unwrap();

        let raw = token(json!({
            "sub": "u-1",
            "exp": Utc::now().timestamp() + 600,
            "iss": "https://evil.test",
            "tenant_id": "t-1",
            "role": "teacher",
        }));
        assert!(provider.resolve(&raw).is_err());
    }

    #[test]
    fn test_unsupported_algorithm() {
        let config = AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            jwt_algorithm: "none".to_string(),
            ..AuthConfig::default()
        };
        assert!(JwtSessionProvider::new(&config).is_err());
    }
}
