//! Portfolio and portfolio entry routes. Every handler asks the
//! security gateway before touching the row; a denial is a 403
//! regardless of whether the row exists.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{permissions, RequestContext};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::pmo::{Portfolio, PortfolioEntry};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BudgetRequest {
    pub budget: f64,
}

async fn load_entry(state: &AppState, id: i64) -> AppResult<PortfolioEntry> {
    state
        .directory
        .portfolio_entry_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("portfolio entry not found"))
}

async fn load_portfolio(state: &AppState, id: i64) -> AppResult<Portfolio> {
    state
        .directory
        .portfolio_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("portfolio not found"))
}

#[utoipa::path(
    get,
    path = "/portfolio-entries/{id}",
    tag = "Portfolio entries",
    params(("id" = i64, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Entry", body = PortfolioEntry),
        (status = 403, description = "Not visible to this principal")
    )
)]
pub async fn view_entry(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<PortfolioEntry>> {
    if !state.security.is_allowed(permissions::PORTFOLIO_ENTRY_VIEW, &ctx).await {
        return Err(AppError::forbidden("portfolio entry view denied"));
    }
    let id = ctx.object_id().ok_or_else(|| AppError::bad_request("missing entry id"))?;
    let mut entry = load_entry(&state, id).await?;
    entry.budget = None;
    Ok(Json(entry))
}

#[utoipa::path(
    get,
    path = "/portfolio-entries/{id}/details",
    tag = "Portfolio entries",
    params(("id" = i64, Path, description = "Entry id")),
    responses((status = 200, description = "Entry detail", body = PortfolioEntry))
)]
pub async fn entry_details(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<PortfolioEntry>> {
    if !state
        .security
        .is_allowed_with_id(permissions::PORTFOLIO_ENTRY_DETAILS, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("portfolio entry details denied"));
    }
    let mut entry = load_entry(&state, id).await?;
    entry.budget = None;
    Ok(Json(entry))
}

#[utoipa::path(
    post,
    path = "/portfolio-entries/{id}/edit",
    tag = "Portfolio entries",
    params(("id" = i64, Path, description = "Entry id")),
    request_body = RenameRequest,
    responses((status = 200, description = "Entry updated", body = PortfolioEntry))
)]
pub async fn edit_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RenameRequest>,
) -> AppResult<Json<PortfolioEntry>> {
    if !state
        .security
        .is_allowed_with_id(permissions::PORTFOLIO_ENTRY_EDIT, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("portfolio entry edit denied"));
    }
    load_entry(&state, id).await?;

    sqlx::query("UPDATE portfolio_entries SET name = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(id)
        .execute(&state.pool)
        .await?;

    let mut entry = load_entry(&state, id).await?;
    entry.budget = None;
    Ok(Json(entry))
}

#[utoipa::path(
    post,
    path = "/portfolio-entries/{id}/delete",
    tag = "Portfolio entries",
    params(("id" = i64, Path, description = "Entry id")),
    responses((status = 204, description = "Entry soft deleted"))
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state
        .security
        .is_allowed_with_id(permissions::PORTFOLIO_ENTRY_DELETE, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("portfolio entry delete denied"));
    }
    load_entry(&state, id).await?;

    sqlx::query("UPDATE portfolio_entries SET deleted_at = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/portfolio-entries/{id}/review-request",
    tag = "Portfolio entries",
    params(("id" = i64, Path, description = "Entry id")),
    responses((status = 202, description = "Review requested"))
)]
pub async fn request_entry_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state
        .security
        .is_allowed_with_id(permissions::PORTFOLIO_ENTRY_REVIEW_REQUEST, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("portfolio entry review request denied"));
    }
    load_entry(&state, id).await?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    get,
    path = "/portfolio-entries/{id}/financials",
    tag = "Portfolio entries",
    params(("id" = i64, Path, description = "Entry id")),
    responses((status = 200, description = "Entry with budget", body = PortfolioEntry))
)]
pub async fn view_entry_financials(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<PortfolioEntry>> {
    if !state
        .security
        .is_allowed_with_id(permissions::PORTFOLIO_ENTRY_FINANCIAL_VIEW, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("portfolio entry financial view denied"));
    }
    let entry = load_entry(&state, id).await?;
    Ok(Json(entry))
}

#[utoipa::path(
    post,
    path = "/portfolio-entries/{id}/financials",
    tag = "Portfolio entries",
    params(("id" = i64, Path, description = "Entry id")),
    request_body = BudgetRequest,
    responses((status = 200, description = "Budget updated", body = PortfolioEntry))
)]
pub async fn edit_entry_financials(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<BudgetRequest>,
) -> AppResult<Json<PortfolioEntry>> {
    if !state
        .security
        .is_allowed_with_id(permissions::PORTFOLIO_ENTRY_FINANCIAL_EDIT, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("portfolio entry financial edit denied"));
    }
    load_entry(&state, id).await?;

    sqlx::query("UPDATE portfolio_entries SET budget = ? WHERE id = ?")
        .bind(payload.budget)
        .bind(id)
        .execute(&state.pool)
        .await?;

    let entry = load_entry(&state, id).await?;
    Ok(Json(entry))
}

#[utoipa::path(
    get,
    path = "/portfolios/{id}",
    tag = "Portfolios",
    params(("id" = i64, Path, description = "Portfolio id")),
    responses((status = 200, description = "Portfolio", body = Portfolio))
)]
pub async fn view_portfolio(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<Portfolio>> {
    if !state.security.is_allowed(permissions::PORTFOLIO_VIEW, &ctx).await {
        return Err(AppError::forbidden("portfolio view denied"));
    }
    let id = ctx.object_id().ok_or_else(|| AppError::bad_request("missing portfolio id"))?;
    let mut portfolio = load_portfolio(&state, id).await?;
    portfolio.budget = None;
    Ok(Json(portfolio))
}

#[utoipa::path(
    post,
    path = "/portfolios/{id}/edit",
    tag = "Portfolios",
    params(("id" = i64, Path, description = "Portfolio id")),
    request_body = RenameRequest,
    responses((status = 200, description = "Portfolio updated", body = Portfolio))
)]
pub async fn edit_portfolio(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RenameRequest>,
) -> AppResult<Json<Portfolio>> {
    if !state
        .security
        .is_allowed_with_id(permissions::PORTFOLIO_EDIT, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("portfolio edit denied"));
    }
    load_portfolio(&state, id).await?;

    sqlx::query("UPDATE portfolios SET name = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(id)
        .execute(&state.pool)
        .await?;

    let mut portfolio = load_portfolio(&state, id).await?;
    portfolio.budget = None;
    Ok(Json(portfolio))
}

#[utoipa::path(
    get,
    path = "/portfolios/{id}/financials",
    tag = "Portfolios",
    params(("id" = i64, Path, description = "Portfolio id")),
    responses((status = 200, description = "Portfolio with budget", body = Portfolio))
)]
pub async fn view_portfolio_financials(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Portfolio>> {
    if !state
        .security
        .is_allowed_with_id(permissions::PORTFOLIO_FINANCIAL_VIEW, &auth.uid, Some(id))
        .await
    {
        return Err(AppError::forbidden("portfolio financial view denied"));
    }
    let portfolio = load_portfolio(&state, id).await?;
    Ok(Json(portfolio))
}
