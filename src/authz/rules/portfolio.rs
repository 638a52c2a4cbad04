//! Portfolio permissions.

use async_trait::async_trait;

use crate::authz::grants;
use crate::authz::rules::{DynamicRule, EvalCtx};
use crate::errors::AppResult;
use crate::models::pmo::Portfolio;

async fn load(ctx: &EvalCtx<'_>, id: Option<i64>) -> AppResult<Option<Portfolio>> {
    match id {
        Some(id) => ctx.directory.portfolio_by_id(id).await,
        None => Ok(None),
    }
}

pub struct View;

#[async_trait]
impl DynamicRule for View {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(portfolio) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::PORTFOLIO_VIEW_ALL) {
            return Ok(true);
        }
        let Some(actor) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        if portfolio.manager_id == Some(actor.id) {
            return Ok(true);
        }
        ctx.directory
            .is_portfolio_stakeholder(actor.id, portfolio.id)
            .await
    }
}

pub struct Edit;

#[async_trait]
impl DynamicRule for Edit {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(portfolio) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::PORTFOLIO_EDIT_ALL) {
            return Ok(true);
        }
        let Some(actor) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        Ok(portfolio.manager_id == Some(actor.id))
    }
}

pub struct FinancialView;

#[async_trait]
impl DynamicRule for FinancialView {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(portfolio) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::PORTFOLIO_FINANCIAL_VIEW_ALL) {
            return Ok(true);
        }
        if !principal.has_permission(grants::PORTFOLIO_FINANCIAL_VIEW) {
            return Ok(false);
        }
        let Some(actor) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        Ok(portfolio.manager_id == Some(actor.id))
    }
}
