//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for trips, invoices, bills, payments, and summaries
//! - Mapping from billing errors to JSON error responses

pub mod error;
pub mod routes;

use axum::Router;
use fleetbill_shared::BillingConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Billing rules (grace period, lock timeout).
    pub billing: BillingConfig,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
