//! Release routes.

use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::authz::{permissions, RequestContext};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::delivery::Release;
use crate::routes::governance::RenameRequest;

async fn load_release(state: &AppState, id: i64) -> AppResult<Release> {
    state
        .directory
        .release_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("release not found"))
}

#[utoipa::path(
    get,
    path = "/releases/{id}",
    tag = "Delivery",
    params(("id" = i64, Path, description = "Release id")),
    responses((status = 200, description = "Release", body = Release))
)]
pub async fn view_release(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<Release>> {
    if !state.security.is_allowed(permissions::RELEASE_VIEW, &ctx).await {
        return Err(AppError::forbidden("release view denied"));
    }
    let id = ctx.object_id().ok_or_else(|| AppError::bad_request("missing release id"))?;
    Ok(Json(load_release(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/releases/{id}/edit",
    tag = "Delivery",
    params(("id" = i64, Path, description = "Release id")),
    request_body = RenameRequest,
    responses((status = 200, description = "Release updated", body = Release))
)]
pub async fn edit_release(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RenameRequest>,
) -> AppResult<Json<Release>> {
    if !state
        .security
        .is_allowed_with_id(permissions::RELEASE_EDIT, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("release edit denied"));
    }
    load_release(&state, id).await?;

    sqlx::query("UPDATE releases SET name = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(load_release(&state, id).await?))
}
