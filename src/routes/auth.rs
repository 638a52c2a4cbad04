use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub uid: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Issue a bearer token for a known principal. Stands in for the
/// identity provider in development and tests.
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "Auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Unknown principal")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM principals WHERE uid = ?")
        .bind(&payload.uid)
        .fetch_one(&state.pool)
        .await?;

    if known == 0 {
        return Err(AppError::unauthorized("unknown principal"));
    }

    let token = state.jwt.encode(&payload.uid)?;
    Ok(Json(TokenResponse { token }))
}
