//! School service actions: schools, departments and the academic calendar.

use reqwest::Method;
use tracing::instrument;

use super::{ActionContext, ActionResult};
use crate::client::endpoints;
use crate::domain::{
    AcademicYear, CreateAcademicYearRequest, CreateDepartmentRequest, CreateGradingPeriodRequest,
    CreateHolidayRequest, CreateSchoolRequest, Department, GradingPeriod, Holiday, School,
    UpdateSchoolRequest,
};
use crate::rbac::permissions;

#[instrument(skip_all, fields(request_id = %ctx.request.request_id))]
pub async fn get_schools_action(ctx: ActionContext<'_>) -> ActionResult<Vec<School>> {
    Ok(ctx.list(endpoints::SCHOOLS).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %id))]
pub async fn get_school_action(ctx: ActionContext<'_>, id: &str) -> ActionResult<School> {
    Ok(ctx.item(&endpoints::school(id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id))]
pub async fn create_school_action(
    ctx: ActionContext<'_>,
    request: &CreateSchoolRequest,
) -> ActionResult<Option<School>> {
    Ok(ctx
        .mutate(&permissions::SCHOOL_CREATE, Method::POST, endpoints::SCHOOLS, request)
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %id))]
pub async fn update_school_action(
    ctx: ActionContext<'_>,
    id: &str,
    request: &UpdateSchoolRequest,
) -> ActionResult<Option<School>> {
    Ok(ctx
        .mutate(&permissions::SCHOOL_UPDATE, Method::PUT, &endpoints::school(id), request)
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %id))]
pub async fn delete_school_action(ctx: ActionContext<'_>, id: &str) -> ActionResult<()> {
    Ok(ctx.remove(&permissions::SCHOOL_DELETE, &endpoints::school(id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %school_id))]
pub async fn get_departments_action(
    ctx: ActionContext<'_>,
    school_id: &str,
) -> ActionResult<Vec<Department>> {
    Ok(ctx.list(&endpoints::departments(school_id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %school_id))]
pub async fn create_department_action(
    ctx: ActionContext<'_>,
    school_id: &str,
    request: &CreateDepartmentRequest,
) -> ActionResult<Option<Department>> {
    Ok(ctx
        .mutate(
            &permissions::DEPARTMENT_CREATE,
            Method::POST,
            &endpoints::departments(school_id),
            request,
        )
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %school_id))]
pub async fn get_academic_years_action(
    ctx: ActionContext<'_>,
    school_id: &str,
) -> ActionResult<Vec<AcademicYear>> {
    Ok(ctx.list(&endpoints::academic_years(school_id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %school_id))]
pub async fn create_academic_year_action(
    ctx: ActionContext<'_>,
    school_id: &str,
    request: &CreateAcademicYearRequest,
) -> ActionResult<Option<AcademicYear>> {
    Ok(ctx
        .mutate(
            &permissions::ACADEMIC_YEAR_CREATE,
            Method::POST,
            &endpoints::academic_years(school_id),
            request,
        )
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, academic_year_id = %academic_year_id))]
pub async fn get_grading_periods_action(
    ctx: ActionContext<'_>,
    academic_year_id: &str,
) -> ActionResult<Vec<GradingPeriod>> {
    Ok(ctx.list(&endpoints::grading_periods(academic_year_id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, academic_year_id = %academic_year_id))]
pub async fn create_grading_period_action(
    ctx: ActionContext<'_>,
    academic_year_id: &str,
    request: &CreateGradingPeriodRequest,
) -> ActionResult<Option<GradingPeriod>> {
    Ok(ctx
        .mutate(
            &permissions::GRADING_PERIOD_CREATE,
            Method::POST,
            &endpoints::grading_periods(academic_year_id),
            request,
        )
        .await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %school_id))]
pub async fn get_holidays_action(
    ctx: ActionContext<'_>,
    school_id: &str,
) -> ActionResult<Vec<Holiday>> {
    Ok(ctx.list(&endpoints::holidays(school_id)).await?)
}

#[instrument(skip_all, fields(request_id = %ctx.request.request_id, school_id = %school_id))]
pub async fn create_holiday_action(
    ctx: ActionContext<'_>,
    school_id: &str,
    request: &CreateHolidayRequest,
) -> ActionResult<Option<Holiday>> {
    Ok(ctx
        .mutate(
            &permissions::HOLIDAY_CREATE,
            Method::POST,
            &endpoints::holidays(school_id),
            request,
        )
        .await?)
}
