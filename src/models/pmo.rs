use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// A person known to the organisation. The `uid` ties an actor to the
/// signed-in principal with the same identifier.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Actor {
    pub id: i64,
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_unit_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OrgUnit {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Portfolio {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<i64>,
    /// Only exposed through the financial views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

/// A governed initiative. Confidential (non-public) entries are only
/// visible to actors related to them; concept entries are hidden from
/// the public shortcut until promoted.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PortfolioEntry {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<i64>,
    /// Only exposed through the financial views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    pub is_public: bool,
    pub is_concept: bool,
    pub archived: bool,
}
