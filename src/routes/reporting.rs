//! Reporting and timesheet routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{permissions, RequestContext};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::reporting::Reporting;

#[utoipa::path(
    get,
    path = "/reportings/{id}",
    tag = "Reporting",
    params(("id" = i64, Path, description = "Reporting id")),
    responses((status = 200, description = "Reporting", body = Reporting))
)]
pub async fn view_reporting(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<Reporting>> {
    if !state.security.is_allowed(permissions::REPORTING_VIEW, &ctx).await {
        return Err(AppError::forbidden("reporting view denied"));
    }
    let id = ctx.object_id().ok_or_else(|| AppError::bad_request("missing reporting id"))?;
    let reporting = state
        .directory
        .reporting_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("reporting not found"))?;
    Ok(Json(reporting))
}

#[utoipa::path(
    post,
    path = "/timesheets/{id}/approve",
    tag = "Reporting",
    params(("id" = i64, Path, description = "Timesheet report id")),
    responses(
        (status = 202, description = "Approval accepted"),
        (status = 403, description = "Not in the submitter's management chain")
    )
)]
pub async fn approve_timesheet(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state
        .security
        .is_allowed_with_id(permissions::TIMESHEET_APPROVAL, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("timesheet approval denied"));
    }
    state
        .directory
        .timesheet_report_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("timesheet report not found"))?;
    Ok(StatusCode::ACCEPTED)
}
