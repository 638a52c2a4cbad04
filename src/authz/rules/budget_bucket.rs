//! Budget bucket permissions. Ownership flows down the management
//! chain: a manager sees the buckets owned by their subordinates.

use async_trait::async_trait;

use crate::authz::grants;
use crate::authz::rules::{self, DynamicRule, EvalCtx};
use crate::errors::AppResult;
use crate::models::finance::BudgetBucket;

async fn load(ctx: &EvalCtx<'_>, id: Option<i64>) -> AppResult<Option<BudgetBucket>> {
    match id {
        Some(id) => ctx.directory.budget_bucket_by_id(id).await,
        None => Ok(None),
    }
}

async fn owner_or_above(
    ctx: &EvalCtx<'_>,
    override_grant: &str,
    bucket: &BudgetBucket,
) -> AppResult<bool> {
    let principal = ctx.principal().await?;
    if principal.has_permission(override_grant) {
        return Ok(true);
    }
    let Some(me) = ctx.current_actor(&principal).await? else {
        return Ok(false);
    };
    rules::self_or_subordinate(ctx.directory, me.id, bucket.owner_id).await
}

pub struct View;

#[async_trait]
impl DynamicRule for View {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(bucket) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        owner_or_above(ctx, grants::BUDGET_BUCKET_VIEW_ALL, &bucket).await
    }
}

pub struct Edit;

#[async_trait]
impl DynamicRule for Edit {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(bucket) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        owner_or_above(ctx, grants::BUDGET_BUCKET_EDIT_ALL, &bucket).await
    }
}
