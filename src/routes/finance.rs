//! Budget bucket routes.

use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::authz::{permissions, RequestContext};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::finance::BudgetBucket;
use crate::routes::governance::RenameRequest;

async fn load_bucket(state: &AppState, id: i64) -> AppResult<BudgetBucket> {
    state
        .directory
        .budget_bucket_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("budget bucket not found"))
}

#[utoipa::path(
    get,
    path = "/budget-buckets/{id}",
    tag = "Finance",
    params(("id" = i64, Path, description = "Bucket id")),
    responses((status = 200, description = "Budget bucket", body = BudgetBucket))
)]
pub async fn view_bucket(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<BudgetBucket>> {
    if !state.security.is_allowed(permissions::BUDGET_BUCKET_VIEW, &ctx).await {
        return Err(AppError::forbidden("budget bucket view denied"));
    }
    let id = ctx.object_id().ok_or_else(|| AppError::bad_request("missing bucket id"))?;
    Ok(Json(load_bucket(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/budget-buckets/{id}/edit",
    tag = "Finance",
    params(("id" = i64, Path, description = "Bucket id")),
    request_body = RenameRequest,
    responses((status = 200, description = "Budget bucket updated", body = BudgetBucket))
)]
pub async fn edit_bucket(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RenameRequest>,
) -> AppResult<Json<BudgetBucket>> {
    if !state
        .security
        .is_allowed_with_id(permissions::BUDGET_BUCKET_EDIT, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("budget bucket edit denied"));
    }
    load_bucket(&state, id).await?;

    sqlx::query("UPDATE budget_buckets SET name = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(load_bucket(&state, id).await?))
}
