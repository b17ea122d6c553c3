//! The RBAC gate: the single decision point for pages and mutating actions.

use std::sync::Arc;

use tracing::{debug, warn};

use super::models::Permission;
use super::policy::{AllowAuthenticated, PermissionEvaluator, PolicyDecision, RolePolicyEvaluator};
use crate::config::{EvaluatorKind, RbacConfig};
use crate::error::{EdforgeError, Result};
use crate::session::Session;
use crate::telemetry::RbacMetrics;

/// Wraps the configured [`PermissionEvaluator`].
#[derive(Clone)]
pub struct RbacGate {
    evaluator: Arc<dyn PermissionEvaluator>,
}

impl RbacGate {
    pub fn new(evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Build the gate selected by configuration.
    pub fn from_config(config: &RbacConfig) -> Self {
        match config.evaluator {
            EvaluatorKind::AllowAuthenticated => Self::new(Arc::new(AllowAuthenticated)),
            EvaluatorKind::RolePolicy => Self::new(Arc::new(RolePolicyEvaluator::with_defaults())),
        }
    }

    pub fn evaluator_name(&self) -> &'static str {
        self.evaluator.name()
    }

    /// Full decision, including the deny reason.
    pub fn check(&self, session: Option<&Session>, permission: &Permission) -> PolicyDecision {
        let decision = match session {
            None => PolicyDecision::Deny("No session".to_string()),
            Some(s) if s.is_expired() => PolicyDecision::Deny("Session expired".to_string()),
            Some(s) => self.evaluator.evaluate(s, permission),
        };

        RbacMetrics::record_decision(decision.is_allowed());
        if let PolicyDecision::Deny(ref reason) = decision {
            debug!(
                evaluator = self.evaluator.name(),
                permission = %permission,
                reason = %reason,
                "Permission denied"
            );
        }
        decision
    }

    /// `has_permission(user, permission) -> bool`.
    pub fn has_permission(&self, session: Option<&Session>, permission: &Permission) -> bool {
        self.check(session, permission).is_allowed()
    }

    /// Like [`check`](Self::check), but as a classified error: no session is
    /// `Unauthorized`, a denial is `Forbidden`.
    pub fn authorize(&self, session: Option<&Session>, permission: &Permission) -> Result<()> {
        let Some(session) = session else {
            return Err(EdforgeError::unauthorized("Sign in to continue"));
        };

        match self.check(Some(session), permission) {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(reason) => {
                warn!(
                    user_id = %session.user_id,
                    tenant_id = %session.tenant_id,
                    permission = %permission,
                    "Permission denied"
                );
                Err(EdforgeError::forbidden("Permission denied")
                    .with_internal_message(reason)
                    .with_context("permission", permission.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for RbacGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RbacGate")
            .field("evaluator", &self.evaluator.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::rbac::models::permissions;
    use crate::rbac::{RoleId, TenantId, UserId};
    use crate::session::AccessToken;
    use chrono::{Duration, Utc};

    fn session(role: &str) -> Session {
        Session {
            user_id: UserId::new("u-1"),
            tenant_id: TenantId::new("t-1"),
            role: RoleId::new(role),
            email: None,
            name: None,
            access_token: AccessToken::new("tok"),
            expires_at: Utc::now() + Duration::minutes(5),
        }
    }

    #[test]
    fn test_no_session_always_denied() {
        for kind in [EvaluatorKind::AllowAuthenticated, EvaluatorKind::RolePolicy] {
            let gate = RbacGate::from_config(&RbacConfig { evaluator: kind });
            assert!(!gate.has_permission(None, &permissions::SCHOOL_READ));
        }
    }

    #[test]
    fn test_expired_session_denied() {
        let gate = RbacGate::from_config(&RbacConfig::default());
        let mut s = session("tenant_admin");
        s.expires_at = Utc::now() - Duration::seconds(5);
        assert!(!gate.has_permission(Some(&s), &permissions::SCHOOL_READ));
    }

    #[test]
    fn test_default_gate_allows_authenticated() {
        let gate = RbacGate::from_config(&RbacConfig::default());
        assert_eq!(gate.evaluator_name(), "allow_authenticated");
        assert!(gate.has_permission(Some(&session("student")), &permissions::USER_CREATE));
    }

    #[test]
    fn test_role_policy_selected_by_config() {
        let gate = RbacGate::from_config(&RbacConfig {
            evaluator: EvaluatorKind::RolePolicy,
        });
        assert_eq!(gate.evaluator_name(), "role_policy");
        assert!(!gate.has_permission(Some(&session("student")), &permissions::USER_CREATE));
        assert!(gate.has_permission(Some(&session("tenant_admin")), &permissions::USER_CREATE));
    }

    #[test]
    fn test_authorize_classifies() {
        let gate = RbacGate::from_config(&RbacConfig {
            evaluator: EvaluatorKind::RolePolicy,
        });

        let err = gate.authorize(None, &permissions::SCHOOL_CREATE).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        let err = gate
            .authorize(Some(&session("parent")), &permissions::SCHOOL_CREATE)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);

        assert!(gate
            .authorize(Some(&session("school_admin")), &permissions::SCHOOL_CREATE)
            .is_ok());
    }
}
