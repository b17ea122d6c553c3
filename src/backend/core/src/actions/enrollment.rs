//! Enrollment service actions: listing, enrolling and withdrawing.

use reqwest::Method;
use tracing::instrument;

use super::{ActionContext, ActionResult};
use crate::client::endpoints;
use crate::domain::{CreateEnrollmentRequest, Enrollment, WithdrawEnrollmentRequest};
use crate::rbac::permissions;

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = ?school_id))]
pub async fn get_enrollments_action(
    ctx: ActionContext<'_>,
    school_id: Option<&str>,
) -> ActionResult<Vec<Enrollment>> {
    Ok(ctx.list(&endpoints::enrollments(school_id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id))]
pub async fn create_enrollment_action(
    ctx: ActionContext<'_>,
    request: &CreateEnrollmentRequest,
) -> ActionResult<Option<Enrollment>> {
    Ok(ctx
        .mutate(
            &permissions::ENROLLMENT_CREATE,
            Method::POST,
            &endpoints::enrollments(None),
            request,
        )
        .await?)
}

/// Withdrawal is a status change, not a delete: the record stays.
#[instrument(skip_all, fields(request_id = %ctx.request.request_id, enrollment_id = %id))]
pub async fn withdraw_enrollment_action(
    ctx: ActionContext<'_>,
    id: &str,
    request: &WithdrawEnrollmentRequest,
) -> ActionResult<Option<Enrollment>> {
    Ok(ctx
        .mutate(
            &permissions::ENROLLMENT_WITHDRAW,
            Method::PATCH,
            &endpoints::enrollment(id),
            request,
        )
        .await?)
}
