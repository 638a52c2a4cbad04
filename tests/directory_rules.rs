//! Rules driven by the management chain and explicit access lists:
//! actors, org units, budget buckets, releases, reportings and
//! timesheet approval, plus the directory lookups behind them.

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use tempfile::TempDir;

use pfolio::authz::{permissions, SecurityService};
use pfolio::store::{DirectoryStore, SqlAccounts, SqlDirectory};

async fn setup() -> Result<(TempDir, SqlitePool)> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.db");

    use sqlx::sqlite::SqliteConnectOptions;
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    Ok((dir, pool))
}

fn service(pool: &SqlitePool) -> SecurityService {
    SecurityService::new(
        Arc::new(SqlDirectory::new(pool.clone())),
        Arc::new(SqlAccounts::new(pool.clone())),
    )
}

/// u10 manages actor 11, who manages actor 13. Actor 12 is unrelated.
async fn seed_chain(pool: &SqlitePool) -> Result<()> {
    for uid in ["u10", "u11", "u12", "u13"] {
        sqlx::query("INSERT INTO principals (uid) VALUES (?)")
            .bind(uid)
            .execute(pool)
            .await?;
    }
    sqlx::query(
        "INSERT INTO actors (id, uid, manager_id) VALUES \
         (10, 'u10', NULL), (11, 'u11', 10), (12, 'u12', NULL), (13, 'u13', 11)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[tokio::test]
async fn subordinate_chain_is_transitive() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_chain(&pool).await?;

    let directory = SqlDirectory::new(pool.clone());
    let mut ids = directory.subordinate_ids(10).await?;
    ids.sort();
    assert_eq!(ids, vec![11, 13]);
    assert!(directory.subordinate_ids(12).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_uid_resolves_to_lowest_id() -> Result<()> {
    let (_dir, pool) = setup().await?;
    sqlx::query("INSERT INTO actors (id, uid) VALUES (30, 'dup'), (31, 'dup')")
        .execute(&pool)
        .await?;

    let directory = SqlDirectory::new(pool.clone());
    let actor = directory.actor_by_uid("dup").await?.unwrap();
    assert_eq!(actor.id, 30);

    // Deleting the winner promotes the next row, still deterministic.
    sqlx::query("UPDATE actors SET deleted_at = datetime('now') WHERE id = 30")
        .execute(&pool)
        .await?;
    let actor = directory.actor_by_uid("dup").await?.unwrap();
    assert_eq!(actor.id, 31);
    Ok(())
}

#[tokio::test]
async fn actor_visibility_follows_the_management_chain() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_chain(&pool).await?;

    let svc = service(&pool);
    // Self.
    assert!(svc.is_allowed_with_id(permissions::ACTOR_VIEW, "u11", Some(11)).await);
    // Direct report.
    assert!(svc.is_allowed_with_id(permissions::ACTOR_VIEW, "u10", Some(11)).await);
    // Report of a report.
    assert!(svc.is_allowed_with_id(permissions::ACTOR_VIEW, "u10", Some(13)).await);
    // Unrelated.
    assert!(!svc.is_allowed_with_id(permissions::ACTOR_VIEW, "u10", Some(12)).await);
    Ok(())
}

#[tokio::test]
async fn actor_edit_is_self_only_without_override() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_chain(&pool).await?;
    sqlx::query("INSERT INTO principals (uid) VALUES ('hr')")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO principal_permissions (uid, permission) VALUES ('hr', 'actor.edit_all')")
        .execute(&pool)
        .await?;

    let svc = service(&pool);
    assert!(svc.is_allowed_with_id(permissions::ACTOR_EDIT, "u11", Some(11)).await);
    assert!(!svc.is_allowed_with_id(permissions::ACTOR_EDIT, "u10", Some(11)).await);
    assert!(svc.is_allowed_with_id(permissions::ACTOR_EDIT, "hr", Some(11)).await);
    // Deletion is override-only; even self is denied.
    assert!(!svc.is_allowed_with_id(permissions::ACTOR_DELETE, "u11", Some(11)).await);
    assert!(svc.is_allowed_with_id(permissions::ACTOR_DELETE, "hr", Some(11)).await);
    Ok(())
}

#[tokio::test]
async fn org_unit_view_requires_managing_the_unit_manager() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_chain(&pool).await?;
    sqlx::query("INSERT INTO org_units (id, name, manager_id) VALUES (21, 'a', 11), (22, 'b', 12)")
        .execute(&pool)
        .await?;

    let svc = service(&pool);
    // Unit 21 is run by u10's subordinate.
    assert!(svc.is_allowed_with_id(permissions::ORG_UNIT_VIEW, "u10", Some(21)).await);
    assert!(svc.is_allowed_with_id(permissions::ORG_UNIT_VIEW, "u11", Some(21)).await);
    assert!(!svc.is_allowed_with_id(permissions::ORG_UNIT_VIEW, "u10", Some(22)).await);
    Ok(())
}

#[tokio::test]
async fn budget_bucket_access_reaches_subordinate_owners() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_chain(&pool).await?;
    sqlx::query("INSERT INTO budget_buckets (id, name, owner_id) VALUES (60, 'x', 13), (61, 'y', 12)")
        .execute(&pool)
        .await?;

    let svc = service(&pool);
    assert!(svc.is_allowed_with_id(permissions::BUDGET_BUCKET_VIEW, "u13", Some(60)).await);
    // Transitive: 13 reports to 11 reports to 10.
    assert!(svc.is_allowed_with_id(permissions::BUDGET_BUCKET_EDIT, "u10", Some(60)).await);
    assert!(!svc.is_allowed_with_id(permissions::BUDGET_BUCKET_VIEW, "u10", Some(61)).await);
    Ok(())
}

#[tokio::test]
async fn release_access_is_manager_only() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_chain(&pool).await?;
    sqlx::query("INSERT INTO releases (id, name, manager_id) VALUES (70, 'r1', 11)")
        .execute(&pool)
        .await?;

    let svc = service(&pool);
    assert!(svc.is_allowed_with_id(permissions::RELEASE_VIEW, "u11", Some(70)).await);
    assert!(svc.is_allowed_with_id(permissions::RELEASE_EDIT, "u11", Some(70)).await);
    // The management chain does not extend to releases.
    assert!(!svc.is_allowed_with_id(permissions::RELEASE_VIEW, "u10", Some(70)).await);
    Ok(())
}

#[tokio::test]
async fn reporting_access_is_public_or_listed() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_chain(&pool).await?;
    sqlx::query("INSERT INTO reportings (id, name, is_public) VALUES (80, 'open', 1), (81, 'closed', 0)")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO reporting_principals (reporting_id, uid) VALUES (81, 'u12')")
        .execute(&pool)
        .await?;

    let svc = service(&pool);
    assert!(svc.is_allowed_with_id(permissions::REPORTING_VIEW, "u10", Some(80)).await);
    assert!(svc.is_allowed_with_id(permissions::REPORTING_VIEW, "u12", Some(81)).await);
    assert!(!svc.is_allowed_with_id(permissions::REPORTING_VIEW, "u10", Some(81)).await);
    Ok(())
}

#[tokio::test]
async fn timesheet_approval_walks_the_chain_upward_only() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_chain(&pool).await?;
    sqlx::query("INSERT INTO timesheet_reports (id, actor_id) VALUES (90, 13), (91, 10)")
        .execute(&pool)
        .await?;

    let svc = service(&pool);
    // Direct manager and the manager above both approve.
    assert!(svc.is_allowed_with_id(permissions::TIMESHEET_APPROVAL, "u11", Some(90)).await);
    assert!(svc.is_allowed_with_id(permissions::TIMESHEET_APPROVAL, "u10", Some(90)).await);
    // Never your own report, never a peer's.
    assert!(!svc.is_allowed_with_id(permissions::TIMESHEET_APPROVAL, "u13", Some(90)).await);
    assert!(!svc.is_allowed_with_id(permissions::TIMESHEET_APPROVAL, "u11", Some(91)).await);
    Ok(())
}
