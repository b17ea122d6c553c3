//! Route availability table.
//!
//! Some pages depend on backend operations that do not exist yet. Such routes
//! are listed here as unsupported and turn into redirects to the nearest
//! page that works, instead of rendering something half-broken.

use crate::config::{RoutesConfig, UnsupportedRoute};

/// Whether a page route can be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Supported,
    Unsupported { fallback: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `:name`, matches any single non-empty segment.
    Param,
}

/// A route pattern such as `/dashboard/admin/users/:user_id/edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| {
                if s.starts_with(':') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = split(path);
        for segment in &self.segments {
            match (segment, parts.next()) {
                (Segment::Literal(expected), Some(actual)) if expected == actual => {}
                (Segment::Param, Some(_)) => {}
                _ => return false,
            }
        }
        parts.next().is_none()
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}

/// Maps route patterns to [`Availability`]. Routes not listed are supported.
#[derive(Debug, Clone, Default)]
pub struct RouteAvailability {
    rules: Vec<(RoutePattern, String)>,
}

impl RouteAvailability {
    pub fn new(routes: &[UnsupportedRoute]) -> Self {
        let rules = routes
            .iter()
            .map(|r| (RoutePattern::parse(&r.pattern), r.fallback.clone()))
            .collect();
        Self { rules }
    }

    pub fn from_config(config: &RoutesConfig) -> Self {
        Self::new(&config.unsupported)
    }

    /// The table used when nothing is configured.
    pub fn with_defaults() -> Self {
        Self::from_config(&RoutesConfig::default())
    }

    pub fn lookup(&self, path: &str) -> Availability {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, fallback)| Availability::Unsupported {
                fallback: fallback.clone(),
            })
            .unwrap_or(Availability::Supported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matching() {
        let pattern = RoutePattern::parse("/dashboard/admin/users/:user_id");
        assert!(pattern.matches("/dashboard/admin/users/42"));
        assert!(pattern.matches("/dashboard/admin/users/abc-def/"));
        assert!(pattern.matches("/dashboard/admin/users/42?tab=profile"));
        assert!(!pattern.matches("/dashboard/admin/users"));
        assert!(!pattern.matches("/dashboard/admin/users/42/edit"));
        assert!(!pattern.matches("/dashboard/schools/42"));
    }

    #[test]
    fn test_default_table_redirects_user_detail() {
        let table = RouteAvailability::with_defaults();
        for id in ["1", "u-123", "00000000-0000-0000-0000-000000000000", "%20"] {
            assert_eq!(
                table.lookup(&format!("/dashboard/admin/users/{}", id)),
                Availability::Unsupported {
                    fallback: "/dashboard/admin/users".to_string()
                }
            );
            assert_eq!(
                table.lookup(&format!("/dashboard/admin/users/{}/edit", id)),
                Availability::Unsupported {
                    fallback: "/dashboard/admin/users".to_string()
                }
            );
        }
    }

    #[test]
    fn test_listed_pages_supported() {
        let table = RouteAvailability::with_defaults();
        assert_eq!(table.lookup("/dashboard/admin/users"), Availability::Supported);
        assert_eq!(table.lookup("/dashboard/schools/s1"), Availability::Supported);
    }

    #[test]
    fn test_custom_rules() {
        let table = RouteAvailability::new(&[UnsupportedRoute {
            pattern: "/dashboard/grades/:id/history".to_string(),
            fallback: "/dashboard/grades".to_string(),
        }]);
        assert!(matches!(
            table.lookup("/dashboard/grades/g1/history"),
            Availability::Unsupported { .. }
        ));
        assert_eq!(table.lookup("/dashboard/admin/users/1"), Availability::Supported);
    }
}
