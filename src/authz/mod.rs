//! Dynamic authorization engine.
//!
//! A dynamic permission is decided against a specific target object
//! (portfolio, entry, actor, ...), not just the principal's grants.
//! The [`SecurityService`] is the single entry point: it resolves the
//! target object id from the request, consults the decision cache and
//! falls back to the registered policy rule. Static checks
//! ([`SecurityService::check_permission`]) only test the grant set.

mod cache;
mod context;
mod principal;
mod rules;
mod service;

pub use cache::{DecisionCache, Lookup};
pub use context::RequestContext;
pub use principal::Principal;
pub use rules::{DynamicRule, EvalCtx};
pub use service::SecurityService;

/// Dynamic permission names, one registered rule each.
pub mod permissions {
    pub const PORTFOLIO_ENTRY_VIEW: &str = "portfolio_entry.view";
    pub const PORTFOLIO_ENTRY_DETAILS: &str = "portfolio_entry.details";
    pub const PORTFOLIO_ENTRY_EDIT: &str = "portfolio_entry.edit";
    pub const PORTFOLIO_ENTRY_DELETE: &str = "portfolio_entry.delete";
    pub const PORTFOLIO_ENTRY_REVIEW_REQUEST: &str = "portfolio_entry.review_request";
    pub const PORTFOLIO_ENTRY_FINANCIAL_VIEW: &str = "portfolio_entry.financial_view";
    pub const PORTFOLIO_ENTRY_FINANCIAL_EDIT: &str = "portfolio_entry.financial_edit";

    pub const PORTFOLIO_VIEW: &str = "portfolio.view";
    pub const PORTFOLIO_EDIT: &str = "portfolio.edit";
    pub const PORTFOLIO_FINANCIAL_VIEW: &str = "portfolio.financial_view";

    pub const BUDGET_BUCKET_VIEW: &str = "budget_bucket.view";
    pub const BUDGET_BUCKET_EDIT: &str = "budget_bucket.edit";

    pub const RELEASE_VIEW: &str = "release.view";
    pub const RELEASE_EDIT: &str = "release.edit";

    pub const REPORTING_VIEW: &str = "reporting.view";

    pub const TIMESHEET_APPROVAL: &str = "timesheet.approval";

    pub const ACTOR_VIEW: &str = "actor.view";
    pub const ACTOR_EDIT: &str = "actor.edit";
    pub const ACTOR_DELETE: &str = "actor.delete";

    pub const ORG_UNIT_VIEW: &str = "org_unit.view";
}

/// Static permission grants consulted by the rules. The `*_all`
/// grants are global overrides that bypass the relational checks.
pub mod grants {
    pub const PORTFOLIO_ENTRY_VIEW_ALL: &str = "portfolio_entry.view_all";
    pub const PORTFOLIO_ENTRY_EDIT_ALL: &str = "portfolio_entry.edit_all";
    pub const PORTFOLIO_ENTRY_DELETE_ALL: &str = "portfolio_entry.delete_all";
    pub const PORTFOLIO_ENTRY_REVIEW_REQUEST_ALL: &str = "portfolio_entry.review_request_all";
    pub const PORTFOLIO_ENTRY_FINANCIAL_VIEW_ALL: &str = "portfolio_entry.financial_view_all";
    pub const PORTFOLIO_ENTRY_FINANCIAL_EDIT_ALL: &str = "portfolio_entry.financial_edit_all";
    /// Dedicated financial grant required alongside a relationship.
    pub const PORTFOLIO_ENTRY_FINANCIAL_VIEW: &str = "portfolio_entry.financial_view";
    pub const PORTFOLIO_ENTRY_FINANCIAL_EDIT: &str = "portfolio_entry.financial_edit";

    pub const PORTFOLIO_VIEW_ALL: &str = "portfolio.view_all";
    pub const PORTFOLIO_EDIT_ALL: &str = "portfolio.edit_all";
    pub const PORTFOLIO_FINANCIAL_VIEW_ALL: &str = "portfolio.financial_view_all";
    pub const PORTFOLIO_FINANCIAL_VIEW: &str = "portfolio.financial_view";

    pub const BUDGET_BUCKET_VIEW_ALL: &str = "budget_bucket.view_all";
    pub const BUDGET_BUCKET_EDIT_ALL: &str = "budget_bucket.edit_all";

    pub const RELEASE_VIEW_ALL: &str = "release.view_all";
    pub const RELEASE_EDIT_ALL: &str = "release.edit_all";

    pub const REPORTING_VIEW_ALL: &str = "reporting.view_all";

    pub const TIMESHEET_APPROVAL_ALL: &str = "timesheet.approval_all";

    pub const ACTOR_VIEW_ALL: &str = "actor.view_all";
    pub const ACTOR_EDIT_ALL: &str = "actor.edit_all";

    pub const ORG_UNIT_VIEW_ALL: &str = "org_unit.view_all";
}
