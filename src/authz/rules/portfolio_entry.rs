//! Portfolio entry permissions. The widest family: visibility is
//! gated on confidentiality, editing on archival, and the financial
//! pair needs a dedicated grant on top of a relationship.

use async_trait::async_trait;

use crate::authz::grants;
use crate::authz::rules::{DynamicRule, EvalCtx};
use crate::authz::Principal;
use crate::errors::AppResult;
use crate::models::pmo::PortfolioEntry;

async fn load(ctx: &EvalCtx<'_>, id: Option<i64>) -> AppResult<Option<PortfolioEntry>> {
    match id {
        Some(id) => ctx.directory.portfolio_entry_by_id(id).await,
        None => Ok(None),
    }
}

/// Any relationship that ties the actor to the entry, direct or
/// through a containing portfolio.
async fn related(ctx: &EvalCtx<'_>, actor_id: i64, entry: &PortfolioEntry) -> AppResult<bool> {
    if entry.manager_id == Some(actor_id) {
        return Ok(true);
    }
    if ctx.directory.is_entry_stakeholder(actor_id, entry.id).await? {
        return Ok(true);
    }
    if ctx
        .directory
        .is_portfolio_stakeholder_of_entry(actor_id, entry.id)
        .await?
    {
        return Ok(true);
    }
    ctx.directory
        .is_portfolio_manager_of_entry(actor_id, entry.id)
        .await
}

async fn related_actor(
    ctx: &EvalCtx<'_>,
    principal: &Principal,
    entry: &PortfolioEntry,
) -> AppResult<bool> {
    let Some(actor) = ctx.current_actor(principal).await? else {
        return Ok(false);
    };
    related(ctx, actor.id, entry).await
}

pub struct View;

#[async_trait]
impl DynamicRule for View {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(entry) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_any_permission(&[
            grants::PORTFOLIO_ENTRY_VIEW_ALL,
            grants::PORTFOLIO_ENTRY_FINANCIAL_VIEW_ALL,
        ]) {
            return Ok(true);
        }
        if entry.is_public && !entry.is_concept {
            return Ok(true);
        }
        // Confidential entry: only related actors get through.
        let Some(actor) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        if related(ctx, actor.id, &entry).await? {
            return Ok(true);
        }
        ctx.directory
            .is_delivery_unit_member_of_entry(actor.id, entry.id)
            .await
    }
}

pub struct Details;

#[async_trait]
impl DynamicRule for Details {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(entry) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_any_permission(&[
            grants::PORTFOLIO_ENTRY_VIEW_ALL,
            grants::PORTFOLIO_ENTRY_FINANCIAL_VIEW_ALL,
        ]) {
            return Ok(true);
        }
        related_actor(ctx, &principal, &entry).await
    }
}

pub struct Edit;

#[async_trait]
impl DynamicRule for Edit {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(entry) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        if entry.archived {
            return Ok(false);
        }
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::PORTFOLIO_ENTRY_EDIT_ALL) {
            return Ok(true);
        }
        let Some(actor) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        if entry.manager_id == Some(actor.id) {
            return Ok(true);
        }
        ctx.directory
            .is_portfolio_manager_of_entry(actor.id, entry.id)
            .await
    }
}

pub struct Delete;

#[async_trait]
impl DynamicRule for Delete {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        if load(ctx, object_id).await?.is_none() {
            return Ok(true);
        }
        let principal = ctx.principal().await?;
        Ok(principal.has_permission(grants::PORTFOLIO_ENTRY_DELETE_ALL))
    }
}

pub struct ReviewRequest;

#[async_trait]
impl DynamicRule for ReviewRequest {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(entry) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::PORTFOLIO_ENTRY_REVIEW_REQUEST_ALL) {
            return Ok(true);
        }
        let Some(actor) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        ctx.directory
            .is_portfolio_manager_of_entry(actor.id, entry.id)
            .await
    }
}

pub struct FinancialView;

#[async_trait]
impl DynamicRule for FinancialView {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(entry) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::PORTFOLIO_ENTRY_FINANCIAL_VIEW_ALL) {
            return Ok(true);
        }
        // The dedicated grant alone is not enough; a relationship to
        // the entry is also required.
        if !principal.has_permission(grants::PORTFOLIO_ENTRY_FINANCIAL_VIEW) {
            return Ok(false);
        }
        related_actor(ctx, &principal, &entry).await
    }
}

pub struct FinancialEdit;

#[async_trait]
impl DynamicRule for FinancialEdit {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(entry) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::PORTFOLIO_ENTRY_FINANCIAL_EDIT_ALL) {
            return Ok(true);
        }
        if !principal.has_permission(grants::PORTFOLIO_ENTRY_FINANCIAL_EDIT) {
            return Ok(false);
        }
        let Some(actor) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        Ok(entry.manager_id == Some(actor.id))
    }
}
