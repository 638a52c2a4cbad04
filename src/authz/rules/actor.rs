//! Actor permissions. Self-service plus line-management visibility.

use async_trait::async_trait;

use crate::authz::grants;
use crate::authz::rules::{self, DynamicRule, EvalCtx};
use crate::errors::AppResult;
use crate::models::pmo::Actor;

async fn load(ctx: &EvalCtx<'_>, id: Option<i64>) -> AppResult<Option<Actor>> {
    match id {
        Some(id) => ctx.directory.actor_by_id(id).await,
        None => Ok(None),
    }
}

pub struct View;

#[async_trait]
impl DynamicRule for View {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(target) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::ACTOR_VIEW_ALL) {
            return Ok(true);
        }
        let Some(me) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        if target.id == me.id {
            return Ok(true);
        }
        rules::self_or_subordinate(ctx.directory, me.id, target.manager_id).await
    }
}

pub struct Edit;

#[async_trait]
impl DynamicRule for Edit {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(target) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::ACTOR_EDIT_ALL) {
            return Ok(true);
        }
        let Some(me) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        Ok(target.id == me.id)
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
        Ok(principal.has_permission(grants::ACTOR_EDIT_ALL))
    }
}
