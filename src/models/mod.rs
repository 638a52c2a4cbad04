pub mod delivery;
pub mod finance;
pub mod pmo;
pub mod reporting;
pub mod timesheet;
