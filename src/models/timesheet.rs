use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// A submitted timesheet awaiting approval by the owning actor's
/// management chain.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TimesheetReport {
    pub id: i64,
    pub actor_id: i64,
}
