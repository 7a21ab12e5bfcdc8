//! Spending view module
//!
//! Provides the interactive chart page that breaks down expenses by category
//! over a selectable date range, group-by mode and display currency.

mod aggregation;
mod charts;
mod filters;
mod handlers;
mod tables;

pub use handlers::{get_spending_page, update_spending_view};
