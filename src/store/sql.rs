use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::authz::Principal;
use crate::errors::AppResult;
use crate::models::delivery::Release;
use crate::models::finance::BudgetBucket;
use crate::models::pmo::{Actor, OrgUnit, Portfolio, PortfolioEntry};
use crate::models::reporting::Reporting;
use crate::models::timesheet::TimesheetReport;

use super::{AccountStore, DirectoryStore};

/// SQLite-backed [`DirectoryStore`].
#[derive(Clone)]
pub struct SqlDirectory {
    pool: SqlitePool,
}

impl SqlDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for SqlDirectory {
    async fn actor_by_id(&self, id: i64) -> AppResult<Option<Actor>> {
        let actor = sqlx::query_as::<_, Actor>(
            "SELECT id, uid, manager_id, org_unit_id FROM actors WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(actor)
    }

    async fn actor_by_uid(&self, uid: &str) -> AppResult<Option<Actor>> {
        // Duplicate uids can exist after directory imports; take the
        // lowest id so the answer is stable.
        let actor = sqlx::query_as::<_, Actor>(
            "SELECT id, uid, manager_id, org_unit_id FROM actors \
             WHERE uid = ? AND deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(actor)
    }

    async fn org_unit_by_id(&self, id: i64) -> AppResult<Option<OrgUnit>> {
        let unit = sqlx::query_as::<_, OrgUnit>(
            "SELECT id, name, manager_id FROM org_units WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(unit)
    }

    async fn portfolio_by_id(&self, id: i64) -> AppResult<Option<Portfolio>> {
        let portfolio = sqlx::query_as::<_, Portfolio>(
            "SELECT id, name, manager_id, budget FROM portfolios WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(portfolio)
    }

    async fn portfolio_entry_by_id(&self, id: i64) -> AppResult<Option<PortfolioEntry>> {
        let entry = sqlx::query_as::<_, PortfolioEntry>(
            "SELECT id, name, manager_id, budget, is_public, is_concept, archived \
             FROM portfolio_entries WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn budget_bucket_by_id(&self, id: i64) -> AppResult<Option<BudgetBucket>> {
        let bucket = sqlx::query_as::<_, BudgetBucket>(
            "SELECT id, name, owner_id FROM budget_buckets WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bucket)
    }

    async fn release_by_id(&self, id: i64) -> AppResult<Option<Release>> {
        let release = sqlx::query_as::<_, Release>(
            "SELECT id, name, manager_id FROM releases WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(release)
    }

    async fn reporting_by_id(&self, id: i64) -> AppResult<Option<Reporting>> {
        let reporting = sqlx::query_as::<_, Reporting>(
            "SELECT id, name, is_public FROM reportings WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reporting)
    }

    async fn timesheet_report_by_id(&self, id: i64) -> AppResult<Option<TimesheetReport>> {
        let report = sqlx::query_as::<_, TimesheetReport>(
            "SELECT id, actor_id FROM timesheet_reports WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }

    async fn is_portfolio_stakeholder(
        &self,
        actor_id: i64,
        portfolio_id: i64,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM portfolio_stakeholders \
             WHERE portfolio_id = ? AND actor_id = ? AND deleted_at IS NULL",
        )
        .bind(portfolio_id)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn is_entry_stakeholder(&self, actor_id: i64, entry_id: i64) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM portfolio_entry_stakeholders \
             WHERE entry_id = ? AND actor_id = ? AND deleted_at IS NULL",
        )
        .bind(entry_id)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn is_portfolio_stakeholder_of_entry(
        &self,
        actor_id: i64,
        entry_id: i64,
    ) -> AppResult<bool> {
        // Two-relation membership: the entry's portfolios, then their
        // stakeholder lists. Deleted portfolios and deleted stakeholder
        // links are both excluded.
        let row = sqlx::query(
            "SELECT COUNT(*) AS n \
             FROM portfolio_entry_portfolios pep \
             INNER JOIN portfolios p ON p.id = pep.portfolio_id AND p.deleted_at IS NULL \
             INNER JOIN portfolio_stakeholders ps \
                ON ps.portfolio_id = p.id AND ps.deleted_at IS NULL \
             WHERE pep.entry_id = ? AND ps.actor_id = ?",
        )
        .bind(entry_id)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn is_portfolio_manager_of_entry(
        &self,
        actor_id: i64,
        entry_id: i64,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n \
             FROM portfolio_entry_portfolios pep \
             INNER JOIN portfolios p ON p.id = pep.portfolio_id AND p.deleted_at IS NULL \
             WHERE pep.entry_id = ? AND p.manager_id = ?",
        )
        .bind(entry_id)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn is_delivery_unit_member_of_entry(
        &self,
        actor_id: i64,
        entry_id: i64,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n \
             FROM portfolio_entry_delivery_units pdu \
             INNER JOIN org_units ou ON ou.id = pdu.org_unit_id AND ou.deleted_at IS NULL \
             LEFT JOIN actors a ON a.org_unit_id = ou.id AND a.deleted_at IS NULL \
             WHERE pdu.entry_id = ? AND (a.id = ? OR ou.manager_id = ?)",
        )
        .bind(entry_id)
        .bind(actor_id)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn subordinate_ids(&self, actor_id: i64) -> AppResult<Vec<i64>> {
        let rows = sqlx::query(
            "WITH RECURSIVE chain(id) AS ( \
                SELECT id FROM actors WHERE manager_id = ? AND deleted_at IS NULL \
                UNION \
                SELECT a.id FROM actors a \
                INNER JOIN chain c ON a.manager_id = c.id \
                WHERE a.deleted_at IS NULL \
             ) SELECT id FROM chain",
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get::<i64, _>("id")).collect())
    }

    async fn reporting_allows_uid(&self, reporting_id: i64, uid: &str) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM reporting_principals WHERE reporting_id = ? AND uid = ?",
        )
        .bind(reporting_id)
        .bind(uid)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") > 0)
    }
}

/// SQLite-backed [`AccountStore`].
#[derive(Clone)]
pub struct SqlAccounts {
    pool: SqlitePool,
}

impl SqlAccounts {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for SqlAccounts {
    async fn principal_by_uid(&self, uid: &str) -> AppResult<Option<Principal>> {
        let row = sqlx::query("SELECT uid, preferred_language FROM principals WHERE uid = ?")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let grants = sqlx::query("SELECT permission FROM principal_permissions WHERE uid = ?")
            .bind(uid)
            .fetch_all(&self.pool)
            .await?;

        let principal = Principal::new(row.get::<String, _>("uid"))
            .with_language(row.get::<String, _>("preferred_language"))
            .with_permissions(grants.iter().map(|r| r.get::<String, _>("permission")));

        Ok(Some(principal))
    }
}
