use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// A saved report. Non-public reports carry an explicit list of
/// authorized principal uids (see `reporting_principals`).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Reporting {
    pub id: i64,
    pub name: String,
    pub is_public: bool,
}
