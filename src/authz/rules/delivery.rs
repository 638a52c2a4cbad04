//! Release permissions.

use async_trait::async_trait;

use crate::authz::grants;
use crate::authz::rules::{DynamicRule, EvalCtx};
use crate::errors::AppResult;
use crate::models::delivery::Release;

async fn load(ctx: &EvalCtx<'_>, id: Option<i64>) -> AppResult<Option<Release>> {
    match id {
        Some(id) => ctx.directory.release_by_id(id).await,
        None => Ok(None),
    }
}

async fn manages(ctx: &EvalCtx<'_>, override_grant: &str, release: &Release) -> AppResult<bool> {
    let principal = ctx.principal().await?;
    if principal.has_permission(override_grant) {
        return Ok(true);
    }
    let Some(me) = ctx.current_actor(&principal).await? else {
        return Ok(false);
    };
    Ok(release.manager_id == Some(me.id))
}

pub struct ReleaseView;

#[async_trait]
impl DynamicRule for ReleaseView {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(release) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        manages(ctx, grants::RELEASE_VIEW_ALL, &release).await
    }
}

pub struct ReleaseEdit;

#[async_trait]
impl DynamicRule for ReleaseEdit {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let Some(release) = load(ctx, object_id).await? else {
            return Ok(true);
        };
        manages(ctx, grants::RELEASE_EDIT_ALL, &release).await
    }
}
