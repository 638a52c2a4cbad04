use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::SecurityService;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, authz, delivery, finance, governance, health, pmo, reporting};
use crate::store::{DirectoryStore, SqlAccounts, SqlDirectory};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub security: Arc<SecurityService>,
    pub directory: Arc<dyn DirectoryStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig) -> Self {
        let directory: Arc<dyn DirectoryStore> = Arc::new(SqlDirectory::new(pool.clone()));
        let accounts = Arc::new(SqlAccounts::new(pool.clone()));
        let security = Arc::new(SecurityService::new(Arc::clone(&directory), accounts));

        Self {
            pool,
            jwt: Arc::new(jwt),
            security,
            directory,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    Ok(router(AppState::new(pool, jwt_config)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let entry_routes = Router::new()
        .route("/:id", get(governance::view_entry))
        .route("/:id/details", get(governance::entry_details))
        .route("/:id/edit", post(governance::edit_entry))
        .route("/:id/delete", post(governance::delete_entry))
        .route("/:id/review-request", post(governance::request_entry_review))
        .route("/:id/financials", get(governance::view_entry_financials))
        .route("/:id/financials", post(governance::edit_entry_financials));

    let portfolio_routes = Router::new()
        .route("/:id", get(governance::view_portfolio))
        .route("/:id/edit", post(governance::edit_portfolio))
        .route("/:id/financials", get(governance::view_portfolio_financials));

    let actor_routes = Router::new()
        .route("/:id", get(pmo::view_actor))
        .route("/:id/edit", post(pmo::edit_actor))
        .route("/:id/delete", post(pmo::delete_actor));

    Router::new()
        .route("/health", get(health::health))
        .route("/auth/token", post(auth::issue_token))
        .route("/authz/check", get(authz::check_dynamic))
        .route("/authz/static/:permission", get(authz::check_static))
        .nest("/portfolio-entries", entry_routes)
        .nest("/portfolios", portfolio_routes)
        .nest("/actors", actor_routes)
        .route("/org-units/:id", get(pmo::view_org_unit))
        .route("/budget-buckets/:id", get(finance::view_bucket))
        .route("/budget-buckets/:id/edit", post(finance::edit_bucket))
        .route("/releases/:id", get(delivery::view_release))
        .route("/releases/:id/edit", post(delivery::edit_release))
        .route("/reportings/:id", get(reporting::view_reporting))
        .route("/timesheets/:id/approve", post(reporting::approve_timesheet))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
