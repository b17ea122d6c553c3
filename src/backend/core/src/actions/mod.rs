//! Server actions.
//!
//! Each action forwards one operation to a fixed backend endpoint and hands
//! back either the decoded record or an [`ActionFailure`] whose message came
//! from [`get_user_friendly_message`](crate::error::get_user_friendly_message).
//! Actions keep nothing between calls; everything about the caller arrives in
//! the [`ActionContext`].
//!
//! Mutating actions run the same three steps in order, and stop at the first
//! failure:
//!
//! 1. RBAC gate (`Unauthorized` without a session, `Forbidden` when denied)
//! 2. input validation (`ValidationFailed`)
//! 3. the backend call
//!
//! # Example
//!
//! ```rust,ignore
//! use edforge_core::actions::{school, ActionContext};
//!
//! let actx = ActionContext::new(&ctx, &state.client, &state.gate);
//! match school::get_schools_action(actx).await {
//!     Ok(schools) => render(schools),
//!     Err(failure) => alert(&failure.message),
//! }
//! ```

pub mod academic;
pub mod enrollment;
pub mod school;
pub mod user;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::ApiClient;
use crate::context::RequestContext;
use crate::domain::{ItemResponse, ListResponse};
use crate::error::{ActionFailure, Result};
use crate::rbac::{Permission, RbacGate};
use crate::session::Session;
use crate::validation::Validate;

/// Outcome of an action as seen by a page.
pub type ActionResult<T> = std::result::Result<T, ActionFailure>;

/// What an action needs to run: the caller, the backend client and the gate.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub request: &'a RequestContext,
    pub client: &'a ApiClient,
    pub gate: &'a RbacGate,
}

impl<'a> ActionContext<'a> {
    pub fn new(request: &'a RequestContext, client: &'a ApiClient, gate: &'a RbacGate) -> Self {
        Self {
            request,
            client,
            gate,
        }
    }

    pub fn session(&self) -> Option<&'a Session> {
        self.request.session()
    }

    /// Whether the caller may use `permission`. Pages use this to hide forms.
    pub fn can(&self, permission: &Permission) -> bool {
        self.gate.has_permission(self.session(), permission)
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let response: ListResponse<T> = self.client.get(self.request, path).await?;
        Ok(response.into_vec())
    }

    async fn item<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response: ItemResponse<T> = self.client.get(self.request, path).await?;
        Ok(response.into_inner())
    }

    /// Gate, validate, then send `body`.
    ///
    /// `None` when the backend accepted the change without returning a
    /// record (204 or a blank 2xx body).
    async fn mutate<B, T>(
        &self,
        permission: &Permission,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Option<T>>
    where
        B: Serialize + Validate,
        T: DeserializeOwned,
    {
        self.gate.authorize(self.session(), permission)?;
        body.validate()?;

        let response: Option<ItemResponse<T>> = self
            .client
            .request(self.request, method, path, Some(body))
            .await?;
        Ok(response.map(ItemResponse::into_inner))
    }

    /// Gate, then DELETE. Whatever the backend answers with is discarded.
    async fn remove(&self, permission: &Permission, path: &str) -> Result<()> {
        self.gate.authorize(self.session(), permission)?;
        let _: serde_json::Value = self.client.delete(self.request, path).await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::rbac::permissions;

    #[test]
    fn test_can_follows_gate() {
        let ctx = signed_in("student");
        let client = client("http://127.0.0.1:9");
        let gate = role_gate();
        let actx = ActionContext::new(&ctx, &client, &gate);

        assert!(actx.can(&permissions::GRADE_READ));
        assert!(!actx.can(&permissions::SCHOOL_CREATE));

        let anonymous = RequestContext::anonymous();
        let open = open_gate();
        let actx = ActionContext::new(&anonymous, &client, &open);
        assert!(!actx.can(&permissions::DASHBOARD_VIEW));
    }
}
