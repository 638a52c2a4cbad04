//! Persistence collaborators consulted by the authorization rules.
//!
//! The rules never build queries themselves; they go through these two
//! traits so tests can run against an in-memory SQLite pool and the
//! policy code stays free of SQL.

mod sql;

pub use sql::{SqlAccounts, SqlDirectory};

use async_trait::async_trait;

use crate::authz::Principal;
use crate::errors::AppResult;
use crate::models::delivery::Release;
use crate::models::finance::BudgetBucket;
use crate::models::pmo::{Actor, OrgUnit, Portfolio, PortfolioEntry};
use crate::models::reporting::Reporting;
use crate::models::timesheet::TimesheetReport;

/// Read-only lookup of domain objects and the relational facts the
/// policy rules consult. Soft-deleted rows are filtered out by every
/// loader, so a deleted object is indistinguishable from a missing one.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn actor_by_id(&self, id: i64) -> AppResult<Option<Actor>>;

    /// Lookup by uid. Duplicate uids are tolerated: the row with the
    /// lowest id wins, deterministically.
    async fn actor_by_uid(&self, uid: &str) -> AppResult<Option<Actor>>;

    async fn org_unit_by_id(&self, id: i64) -> AppResult<Option<OrgUnit>>;
    async fn portfolio_by_id(&self, id: i64) -> AppResult<Option<Portfolio>>;
    async fn portfolio_entry_by_id(&self, id: i64) -> AppResult<Option<PortfolioEntry>>;
    async fn budget_bucket_by_id(&self, id: i64) -> AppResult<Option<BudgetBucket>>;
    async fn release_by_id(&self, id: i64) -> AppResult<Option<Release>>;
    async fn reporting_by_id(&self, id: i64) -> AppResult<Option<Reporting>>;
    async fn timesheet_report_by_id(&self, id: i64) -> AppResult<Option<TimesheetReport>>;

    /// Direct stakeholder of a portfolio.
    async fn is_portfolio_stakeholder(&self, actor_id: i64, portfolio_id: i64) -> AppResult<bool>;

    /// Direct stakeholder of a portfolio entry.
    async fn is_entry_stakeholder(&self, actor_id: i64, entry_id: i64) -> AppResult<bool>;

    /// Stakeholder of any portfolio containing the entry. This is the
    /// indirect, two-relation membership and is distinct from
    /// [`is_entry_stakeholder`](Self::is_entry_stakeholder).
    async fn is_portfolio_stakeholder_of_entry(
        &self,
        actor_id: i64,
        entry_id: i64,
    ) -> AppResult<bool>;

    /// Manager of any portfolio containing the entry.
    async fn is_portfolio_manager_of_entry(&self, actor_id: i64, entry_id: i64)
        -> AppResult<bool>;

    /// Member or manager of one of the entry's delivery units.
    async fn is_delivery_unit_member_of_entry(
        &self,
        actor_id: i64,
        entry_id: i64,
    ) -> AppResult<bool>;

    /// All transitive subordinates of the actor (management chain,
    /// excluding the actor itself).
    async fn subordinate_ids(&self, actor_id: i64) -> AppResult<Vec<i64>>;

    /// Whether the report's authorization list names the uid.
    async fn reporting_allows_uid(&self, reporting_id: i64, uid: &str) -> AppResult<bool>;
}

/// Session/identity collaborator: maps a session uid to the signed-in
/// principal and its static permission grants.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn principal_by_uid(&self, uid: &str) -> AppResult<Option<Principal>>;
}
