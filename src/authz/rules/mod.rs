//! Policy rules, one per dynamic permission name.
//!
//! Every rule follows the same shape: load the target object through
//! the directory store; a missing or soft-deleted object allows the
//! action (the downstream handler will 404 on its own); otherwise the
//! type-specific predicate decides from the principal's grants and the
//! object's relational facts.

mod actor;
mod budget_bucket;
mod delivery;
mod org_unit;
mod portfolio;
mod portfolio_entry;
mod reporting;
mod timesheet;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::authz::permissions;
use crate::authz::Principal;
use crate::errors::{AppError, AppResult};
use crate::models::pmo::Actor;
use crate::store::{AccountStore, DirectoryStore};

/// Collaborators handed to a rule for one evaluation. Built per check;
/// rules never reach into ambient state.
pub struct EvalCtx<'a> {
    pub directory: &'a dyn DirectoryStore,
    pub accounts: &'a dyn AccountStore,
    pub session_uid: &'a str,
}

impl EvalCtx<'_> {
    /// The signed-in principal. An unknown session uid is an error so
    /// the gateway fails closed; rules call this only after the
    /// fail-open missing-object check.
    pub async fn principal(&self) -> AppResult<Principal> {
        self.accounts
            .principal_by_uid(self.session_uid)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(format!("no principal for session uid {}", self.session_uid))
            })
    }

    /// The actor record tied to the principal, if any.
    pub async fn current_actor(&self, principal: &Principal) -> AppResult<Option<Actor>> {
        self.directory.actor_by_uid(&principal.uid).await
    }
}

/// A single dynamic-permission decision.
#[async_trait]
pub trait DynamicRule: Send + Sync {
    async fn evaluate(&self, ctx: &EvalCtx<'_>, object_id: Option<i64>) -> AppResult<bool>;
}

/// True if `candidate` is the actor itself or anywhere below it in the
/// management chain.
pub(crate) async fn self_or_subordinate(
    directory: &dyn DirectoryStore,
    actor_id: i64,
    candidate: Option<i64>,
) -> AppResult<bool> {
    let Some(candidate) = candidate else {
        return Ok(false);
    };
    if candidate == actor_id {
        return Ok(true);
    }
    Ok(directory.subordinate_ids(actor_id).await?.contains(&candidate))
}

/// The full rule table, built once at startup and owned by the
/// security service.
pub(crate) fn registry() -> HashMap<&'static str, Box<dyn DynamicRule>> {
    let mut rules: HashMap<&'static str, Box<dyn DynamicRule>> = HashMap::new();

    rules.insert(permissions::PORTFOLIO_ENTRY_VIEW, Box::new(portfolio_entry::View));
    rules.insert(permissions::PORTFOLIO_ENTRY_DETAILS, Box::new(portfolio_entry::Details));
    rules.insert(permissions::PORTFOLIO_ENTRY_EDIT, Box::new(portfolio_entry::Edit));
    rules.insert(permissions::PORTFOLIO_ENTRY_DELETE, Box::new(portfolio_entry::Delete));
    rules.insert(
        permissions::PORTFOLIO_ENTRY_REVIEW_REQUEST,
        Box::new(portfolio_entry::ReviewRequest),
    );
    rules.insert(
        permissions::PORTFOLIO_ENTRY_FINANCIAL_VIEW,
        Box::new(portfolio_entry::FinancialView),
    );
    rules.insert(
        permissions::PORTFOLIO_ENTRY_FINANCIAL_EDIT,
        Box::new(portfolio_entry::FinancialEdit),
    );

    rules.insert(permissions::PORTFOLIO_VIEW, Box::new(portfolio::View));
    rules.insert(permissions::PORTFOLIO_EDIT, Box::new(portfolio::Edit));
    rules.insert(permissions::PORTFOLIO_FINANCIAL_VIEW, Box::new(portfolio::FinancialView));

    rules.insert(permissions::BUDGET_BUCKET_VIEW, Box::new(budget_bucket::View));
    rules.insert(permissions::BUDGET_BUCKET_EDIT, Box::new(budget_bucket::Edit));

    rules.insert(permissions::RELEASE_VIEW, Box::new(delivery::ReleaseView));
    rules.insert(permissions::RELEASE_EDIT, Box::new(delivery::ReleaseEdit));

    rules.insert(permissions::REPORTING_VIEW, Box::new(reporting::View));

    rules.insert(permissions::TIMESHEET_APPROVAL, Box::new(timesheet::Approval));

    rules.insert(permissions::ACTOR_VIEW, Box::new(actor::View));
    rules.insert(permissions::ACTOR_EDIT, Box::new(actor::Edit));
    rules.insert(permissions::ACTOR_DELETE, Box::new(actor::Delete));

    rules.insert(permissions::ORG_UNIT_VIEW, Box::new(org_unit::View));

    rules
}
