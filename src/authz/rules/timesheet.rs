//! Timesheet approval. Only the management chain above the submitting
//! actor may approve.

use async_trait::async_trait;

use crate::authz::grants;
use crate::authz::rules::{DynamicRule, EvalCtx};
use crate::errors::AppResult;

pub struct Approval;

#[async_trait]
impl DynamicRule for Approval {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let report = match object_id {
            Some(id) => ctx.directory.timesheet_report_by_id(id).await?,
            None => None,
        };
        let Some(report) = report else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::TIMESHEET_APPROVAL_ALL) {
            return Ok(true);
        }
        let Some(me) = ctx.current_actor(&principal).await? else {
            return Ok(false);
        };
        Ok(ctx
            .directory
            .subordinate_ids(me.id)
            .await?
            .contains(&report.actor_id))
    }
}
