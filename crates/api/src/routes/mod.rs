//! API route definitions.

use axum::Router;
use chrono::{NaiveDate, Utc};

use crate::AppState;

pub mod bills;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod trips;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(trips::routes())
        .merge(invoices::routes())
        .merge(bills::routes())
        .merge(payments::routes())
}

/// Day used for overdue checks when the caller does not pin one.
fn today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}
