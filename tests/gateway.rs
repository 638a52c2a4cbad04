//! Decision behavior of the security gateway for portfolio entries
//! and portfolios: relationships, overrides, confidentiality, and the
//! fail-open/fail-closed edges.

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use tempfile::TempDir;

use pfolio::authz::{permissions, SecurityService};
use pfolio::store::{SqlAccounts, SqlDirectory};

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

async fn seed_principal(pool: &SqlitePool, uid: &str, grants: &[&str]) -> Result<()> {
    sqlx::query("INSERT INTO principals (uid) VALUES (?)")
        .bind(uid)
        .execute(pool)
        .await?;
    for grant in grants {
        sqlx::query("INSERT INTO principal_permissions (uid, permission) VALUES (?, ?)")
            .bind(uid)
            .bind(grant)
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn seed_actor(pool: &SqlitePool, id: i64, uid: &str, manager_id: Option<i64>) -> Result<()> {
    sqlx::query("INSERT INTO actors (id, uid, manager_id) VALUES (?, ?, ?)")
        .bind(id)
        .bind(uid)
        .bind(manager_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn seed_entry(
    pool: &SqlitePool,
    id: i64,
    manager_id: Option<i64>,
    is_public: bool,
    is_concept: bool,
    archived: bool,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO portfolio_entries (id, name, manager_id, is_public, is_concept, archived) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(format!("entry-{id}"))
    .bind(manager_id)
    .bind(is_public)
    .bind(is_concept)
    .bind(archived)
    .execute(pool)
    .await?;
    Ok(())
}

#[tokio::test]
async fn entry_manager_may_edit_without_any_grant() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u1", &[]).await?;
    seed_actor(&pool, 1, "u1", None).await?;
    seed_entry(&pool, 42, Some(1), false, false, false).await?;

    let svc = service(&pool);
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_EDIT, "u1", Some(42))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn unrelated_principal_may_not_edit() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u2", &[]).await?;
    seed_actor(&pool, 2, "u2", None).await?;
    seed_entry(&pool, 43, None, false, false, false).await?;

    let svc = service(&pool);
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_EDIT, "u2", Some(43))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn soft_deleted_entry_is_allowed_through() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u2", &[]).await?;
    seed_actor(&pool, 2, "u2", None).await?;
    seed_entry(&pool, 44, None, false, false, false).await?;
    sqlx::query("UPDATE portfolio_entries SET deleted_at = datetime('now') WHERE id = 44")
        .execute(&pool)
        .await?;

    // The check passes so the action layer can produce its own 404.
    let svc = service(&pool);
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_EDIT, "u2", Some(44))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn absent_object_id_is_allowed_through() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u2", &[]).await?;

    let svc = service(&pool);
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_EDIT, "u2", None)
            .await
    );
    Ok(())
}

#[tokio::test]
async fn unknown_permission_name_is_denied() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u2", &[]).await?;
    seed_entry(&pool, 43, None, false, false, false).await?;

    let svc = service(&pool);
    assert!(!svc.is_allowed_with_id("no.such.permission", "u2", Some(43)).await);
    Ok(())
}

#[tokio::test]
async fn unknown_session_uid_is_denied() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_entry(&pool, 43, None, false, false, false).await?;

    let svc = service(&pool);
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_EDIT, "ghost", Some(43))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn public_entry_is_visible_to_any_principal() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u2", &[]).await?;
    seed_actor(&pool, 2, "u2", None).await?;
    seed_entry(&pool, 45, None, true, false, false).await?;

    let svc = service(&pool);
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_VIEW, "u2", Some(45))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn concept_entry_is_not_covered_by_the_public_shortcut() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u2", &[]).await?;
    seed_actor(&pool, 2, "u2", None).await?;
    seed_entry(&pool, 46, None, true, true, false).await?;

    let svc = service(&pool);
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_VIEW, "u2", Some(46))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn confidential_entry_is_hidden_from_unrelated_principals() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u1", &[]).await?;
    seed_principal(&pool, "u2", &[]).await?;
    seed_actor(&pool, 1, "u1", None).await?;
    seed_actor(&pool, 2, "u2", None).await?;
    seed_entry(&pool, 42, Some(1), false, false, false).await?;

    let svc = service(&pool);
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_VIEW, "u1", Some(42))
            .await
    );
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_VIEW, "u2", Some(42))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn portfolio_stakeholder_sees_contained_entries_but_not_others() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u3", &[]).await?;
    seed_actor(&pool, 3, "u3", None).await?;
    sqlx::query("INSERT INTO portfolios (id, name) VALUES (7, 'p7'), (8, 'p8')")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO portfolio_stakeholders (portfolio_id, actor_id) VALUES (7, 3)")
        .execute(&pool)
        .await?;
    seed_entry(&pool, 48, None, false, false, false).await?;
    seed_entry(&pool, 49, None, false, false, false).await?;
    sqlx::query("INSERT INTO portfolio_entry_portfolios (entry_id, portfolio_id) VALUES (48, 7), (49, 8)")
        .execute(&pool)
        .await?;

    let svc = service(&pool);
    // Stakeholdership of portfolio 7 reaches entry 48 but not entry 49.
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_DETAILS, "u3", Some(48))
            .await
    );
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_DETAILS, "u3", Some(49))
            .await
    );
    // And it is portfolio-scoped, not a direct entry stakeholdership.
    assert!(svc.is_allowed_with_id(permissions::PORTFOLIO_VIEW, "u3", Some(7)).await);
    assert!(!svc.is_allowed_with_id(permissions::PORTFOLIO_VIEW, "u3", Some(8)).await);
    Ok(())
}

#[tokio::test]
async fn financial_view_needs_grant_and_relationship() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "granted-manager", &["portfolio_entry.financial_view"]).await?;
    seed_principal(&pool, "granted-outsider", &["portfolio_entry.financial_view"]).await?;
    seed_principal(&pool, "plain-manager", &[]).await?;
    seed_principal(&pool, "auditor", &["portfolio_entry.financial_view_all"]).await?;
    seed_actor(&pool, 4, "granted-manager", None).await?;
    seed_actor(&pool, 5, "granted-outsider", None).await?;
    seed_actor(&pool, 6, "plain-manager", None).await?;
    seed_entry(&pool, 50, Some(4), false, false, false).await?;
    seed_entry(&pool, 51, Some(6), false, false, false).await?;

    let svc = service(&pool);
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_FINANCIAL_VIEW, "granted-manager", Some(50))
            .await
    );
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_FINANCIAL_VIEW, "granted-outsider", Some(50))
            .await
    );
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_FINANCIAL_VIEW, "plain-manager", Some(51))
            .await
    );
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_FINANCIAL_VIEW, "auditor", Some(50))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn archived_entry_is_not_editable_even_with_override() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u1", &[]).await?;
    seed_principal(&pool, "admin", &["portfolio_entry.edit_all"]).await?;
    seed_actor(&pool, 1, "u1", None).await?;
    seed_entry(&pool, 52, Some(1), false, false, true).await?;

    let svc = service(&pool);
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_EDIT, "u1", Some(52))
            .await
    );
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_EDIT, "admin", Some(52))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn delete_requires_the_override_grant() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "u1", &[]).await?;
    seed_principal(&pool, "admin", &["portfolio_entry.delete_all"]).await?;
    seed_actor(&pool, 1, "u1", None).await?;
    seed_entry(&pool, 42, Some(1), false, false, false).await?;

    let svc = service(&pool);
    // Managing the entry is not enough for deletion.
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_DELETE, "u1", Some(42))
            .await
    );
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_DELETE, "admin", Some(42))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn delivery_unit_membership_grants_view_only() -> Result<()> {
    let (_dir, pool) = setup().await?;
    seed_principal(&pool, "dev", &[]).await?;
    seed_actor(&pool, 9, "dev", None).await?;
    sqlx::query("INSERT INTO org_units (id, name) VALUES (20, 'delivery')")
        .execute(&pool)
        .await?;
    sqlx::query("UPDATE actors SET org_unit_id = 20 WHERE id = 9")
        .execute(&pool)
        .await?;
    seed_entry(&pool, 53, None, false, false, false).await?;
    sqlx::query("INSERT INTO portfolio_entry_delivery_units (entry_id, org_unit_id) VALUES (53, 20)")
        .execute(&pool)
        .await?;

    let svc = service(&pool);
    assert!(
        svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_VIEW, "dev", Some(53))
            .await
    );
    assert!(
        !svc.is_allowed_with_id(permissions::PORTFOLIO_ENTRY_DETAILS, "dev", Some(53))
            .await
    );
    Ok(())
}
