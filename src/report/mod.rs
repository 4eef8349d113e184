//! Monthly income and expense summaries.

mod endpoint;
mod monthly;

pub use endpoint::get_monthly_report_endpoint;
pub use monthly::{MonthlyReport, get_monthly_report};
