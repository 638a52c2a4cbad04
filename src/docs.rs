use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::issue_token,
        routes::authz::check_dynamic,
        routes::authz::check_static,
        routes::governance::view_entry,
        routes::governance::entry_details,
        routes::governance::edit_entry,
        routes::governance::delete_entry,
        routes::governance::request_entry_review,
        routes::governance::view_entry_financials,
        routes::governance::edit_entry_financials,
        routes::governance::view_portfolio,
        routes::governance::edit_portfolio,
        routes::governance::view_portfolio_financials,
        routes::pmo::view_actor,
        routes::pmo::edit_actor,
        routes::pmo::delete_actor,
        routes::pmo::view_org_unit,
        routes::finance::view_bucket,
        routes::finance::edit_bucket,
        routes::delivery::view_release,
        routes::delivery::edit_release,
        routes::reporting::view_reporting,
        routes::reporting::approve_timesheet
    ),
    components(
        schemas(
            models::pmo::Actor,
            models::pmo::OrgUnit,
            models::pmo::Portfolio,
            models::pmo::PortfolioEntry,
            models::finance::BudgetBucket,
            models::delivery::Release,
            models::reporting::Reporting,
            models::timesheet::TimesheetReport,
            routes::auth::TokenRequest,
            routes::auth::TokenResponse,
            routes::authz::CheckResponse,
            routes::governance::RenameRequest,
            routes::governance::BudgetRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Token issuance"),
        (name = "Authz", description = "Authorization introspection"),
        (name = "Portfolio entries", description = "Governed initiatives"),
        (name = "Portfolios", description = "Portfolio management"),
        (name = "Actors", description = "People directory"),
        (name = "Org units", description = "Organisation structure"),
        (name = "Finance", description = "Budget buckets"),
        (name = "Delivery", description = "Releases"),
        (name = "Reporting", description = "Reports and timesheets")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_routes() -> Router {
    let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
        .try_it_out_enabled(true)
        .persist_authorization(true);

    let doc = Arc::new(ApiDoc::openapi());

    let json_route = {
        let doc = Arc::clone(&doc);
        get(move || {
            let doc = Arc::clone(&doc);
            async move { Json((*doc).clone()) }
        })
    };

    Router::new()
        .route("/api-docs/openapi.json", json_route)
        .merge(SwaggerUi::new("/docs").config(swagger_config))
}
