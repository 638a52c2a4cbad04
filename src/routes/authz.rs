//! Introspection endpoints: ask the gateway directly instead of
//! hitting a domain route.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app::AppState;
use crate::jwt::AuthUser;
use crate::errors::AppResult;

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub permission: String,
    pub id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckResponse {
    pub allowed: bool,
}

#[utoipa::path(
    get,
    path = "/authz/check",
    tag = "Authz",
    params(
        ("permission" = String, Query, description = "Dynamic permission name"),
        ("id" = Option<i64>, Query, description = "Target object id")
    ),
    responses((status = 200, description = "Decision", body = CheckResponse))
)]
pub async fn check_dynamic(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<CheckParams>,
) -> AppResult<Json<CheckResponse>> {
    let allowed = state
        .security
        .is_allowed_with_id(&params.permission, &auth.uid, params.id)
        .await;
    Ok(Json(CheckResponse { allowed }))
}

#[utoipa::path(
    get,
    path = "/authz/static/{permission}",
    tag = "Authz",
    params(("permission" = String, Path, description = "Static permission name")),
    responses((status = 200, description = "Decision", body = CheckResponse))
)]
pub async fn check_static(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(permission): Path<String>,
) -> AppResult<Json<CheckResponse>> {
    let allowed = state.security.check_permission(&permission, &auth.uid).await;
    Ok(Json(CheckResponse { allowed }))
}
