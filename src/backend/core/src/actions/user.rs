//! User service actions.
//!
//! The backend offers listing and creation only. There is no
//! single-user read or update here; the matching pages are redirect stubs in
//! the route availability table.

use reqwest::Method;
use tracing::instrument;

use super::{ActionContext, ActionResult};
use crate::client::endpoints;
use crate::domain::{CreateUserRequest, User};
use crate::rbac::permissions;

#[instrument(skip_all, fields(request_id = %ctx.request.request_id))]
pub async fn get_users_action(ctx: ActionContext<'_>) -> ActionResult<Vec<User>> {
    Ok(ctx.list(endpoints::USERS).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id))]
pub async fn create_user_action(
    ctx: ActionContext<'_>,
    request: &CreateUserRequest,
) -> ActionResult<Option<User>> {
    Ok(ctx
        .mutate(&permissions::USER_CREATE, Method::POST, endpoints::USERS, request)
        .await?)
}
