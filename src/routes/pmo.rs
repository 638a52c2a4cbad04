//! Actor and org unit routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{permissions, RequestContext};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::pmo::{Actor, OrgUnit};
use crate::routes::governance::RenameRequest;

async fn load_actor(state: &AppState, id: i64) -> AppResult<Actor> {
    state
        .directory
        .actor_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("actor not found"))
}

#[utoipa::path(
    get,
    path = "/actors/{id}",
    tag = "Actors",
    params(("id" = i64, Path, description = "Actor id")),
    responses((status = 200, description = "Actor", body = Actor))
)]
pub async fn view_actor(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Json<Actor>> {
    if !state.security.is_allowed(permissions::ACTOR_VIEW, &ctx).await {
        return Err(AppError::forbidden("actor view denied"));
    }
    let id = ctx.object_id().ok_or_else(|| AppError::bad_request("missing actor id"))?;
    Ok(Json(load_actor(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/actors/{id}/edit",
    tag = "Actors",
    params(("id" = i64, Path, description = "Actor id")),
    request_body = RenameRequest,
    responses((status = 200, description = "Actor updated", body = Actor))
)]
pub async fn edit_actor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RenameRequest>,
) -> AppResult<Json<Actor>> {
    if !state
        .security
        .is_allowed_with_id(permissions::ACTOR_EDIT, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("actor edit denied"));
    }
    load_actor(&state, id).await?;

    // Actors carry no display name of their own yet; the rename
    // updates the uid, which doubles as the login identifier.
    sqlx::query("UPDATE actors SET uid = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(load_actor(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/actors/{id}/delete",
    tag = "Actors",
    params(("id" = i64, Path, description = "Actor id")),
    responses((status = 204, description = "Actor soft deleted"))
)]
pub async fn delete_actor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state
        .security
        .is_allowed_with_id(permissions::ACTOR_DELETE, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("actor delete denied"));
    }
    load_actor(&state, id).await?;

    sqlx::query("UPDATE actors SET deleted_at = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/org-units/{id}",
    tag = "Org units",
    params(("id" = i64, Path, description = "Org unit id")),
    responses((status = 200, description = "Org unit", body = OrgUnit))
)]
pub async fn view_org_unit(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<OrgUnit>> {
    if !state.security.is_allowed(permissions::ORG_UNIT_VIEW, &ctx).await {
        return Err(AppError::forbidden("org unit view denied"));
    }
    let id = ctx.object_id().ok_or_else(|| AppError::bad_request("missing org unit id"))?;
    let unit = state
        .directory
        .org_unit_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("org unit not found"))?;
    Ok(Json(unit))
}
