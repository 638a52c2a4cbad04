pub mod auth;
pub mod authz;
pub mod delivery;
pub mod finance;
pub mod governance;
pub mod health;
pub mod pmo;
pub mod reporting;
