//! Org unit permissions.

use async_trait::async_trait;

use crate::authz::grants;
use crate::authz::rules::{self, DynamicRule, EvalCtx};
use crate::errors::AppResult;

pub struct View;

#[async_trait]
impl DynamicRule for View {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let unit = match object_id {
            Some(id) => ctx.directory.org_unit_by_id(id).await?,
            None => None,
        };
        let Some(unit) = unit else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::ORG_UNIT_VIEW_ALL) {
            return Ok(true);
        }
        let Some(me) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        rules::self_or_subordinate(ctx.directory, me.id, unit.manager_id).await
    }
}
