use axum::http::{header, HeaderMap};

/// The session cookie carrying the access token.
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub max_age_seconds: i64,
    pub secure: bool,
}

impl SessionCookie {
    /// Create a session cookie that lives as long as the token does.
    pub fn new(name: impl Into<String>, value: impl Into<String>, max_age_seconds: i64, secure: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age_seconds: max_age_seconds.max(0),
            secure,
        }
    }

    /// Create a cookie that clears the session (for sign-out)
    pub fn clear(name: impl Into<String>, secure: bool) -> Self {
        Self::new(name, "", 0, secure)
    }

    /// Build the Set-Cookie header value
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, self.value),
            format!("Max-Age={}", self.max_age_seconds),
            "Path=/".to_string(),
            "HttpOnly".to_string(),
            "SameSite=Lax".to_string(),
        ];

        if self.secure {
            parts.push("Secure".to_string());
        }

        parts.join("; ")
    }
}

/// Extract a named cookie from request headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .map(|s| s.trim())
        .find_map(|s| s.strip_prefix(prefix.as_str()))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Extract a bearer token from the Authorization header
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer ")))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The session token of a request: the session cookie first, then a bearer header.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    extract_cookie(headers, cookie_name).or_else(|| extract_bearer(headers))
}
