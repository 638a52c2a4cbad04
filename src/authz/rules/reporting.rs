//! Reporting permissions. Access to a non-public report is granted by
//! an explicit uid list on the report, not by org relationships.

use async_trait::async_trait;

use crate::authz::grants;
use crate::authz::rules::{DynamicRule, EvalCtx};
use crate::errors::AppResult;

pub struct View;

#[async_trait]
impl DynamicRule for View {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool> {
        let report = match object_id {
            Some(id) => ctx.directory.reporting_by_id(id).await?,
            None => None,
        };
        let Some(report) = report else {
            return Ok(true);
        };
        let principal = ctx.principal().await?;
        if principal.has_permission(grants::REPORTING_VIEW_ALL) {
            return Ok(true);
        }
        if report.is_public {
            return Ok(true);
        }
        ctx.directory
            .reporting_allows_uid(report.id, &principal.uid)
            .await
    }
}
