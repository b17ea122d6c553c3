//! Session and access token handling.
//!
//! A [`Session`] is resolved once per request from the `edforge_session`
//! cookie (or an `Authorization: Bearer` header) and then travels inside the
//! request context. The raw access token is wrapped in [`AccessToken`], which
//! cannot be serialized and prints as `[REDACTED]`, so it can only leave the
//! process through [`AccessToken::expose`] in the API client.

pub mod cookie;
pub mod jwt;

pub use cookie::{extract_session_token, SessionCookie};
pub use jwt::JwtSessionProvider;

use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::Result;
use crate::rbac::{RoleId, TenantId, UserId};

/// Local sign-in page. Unauthenticated page requests are sent here.
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// Bearer token issued by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token. Only the outbound HTTP client should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// The authenticated user behind a request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: RoleId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub access_token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Seconds until expiry, floored at zero.
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }

    /// Name shown in the user badge.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.user_id.as_str())
    }
}

/// Turns a raw access token into a [`Session`].
///
/// Implementations must reject expired tokens.
pub trait SessionProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Session>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(name: Option<&str>, email: Option<&str>) -> Session {
        Session {
            user_id: UserId::new("u-1"),
            tenant_id: TenantId::new("t-1"),
            role: RoleId::new("teacher"),
            email: email.map(String::from),
            name: name.map(String::from),
            access_token: AccessToken::new("eyJ.secret.value"),
            expires_at: Utc::now() + Duration::minutes(5),
        }
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let s = session(None, None);
        let debug = format!("{:?}", s);
        assert!(!debug.contains("eyJ.secret.value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(session(Some("Ada"), Some("ada@x.io")).display_name(), "Ada");
        assert_eq!(session(None, Some("ada@x.io")).display_name(), "ada@x.io");
        assert_eq!(session(None, None).display_name(), "u-1");
    }

    #[test]
    fn test_expiry() {
        let mut s = session(None, None);
        assert!(!s.is_expired());
        assert!(s.remaining_secs() > 0);
        s.expires_at = Utc::now() - Duration::seconds(1);
        assert!(s.is_expired());
        assert_eq!(s.remaining_secs(), 0);
    }
}
