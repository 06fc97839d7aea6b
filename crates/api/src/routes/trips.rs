//! Trip routes: unbilled dates, unbilled trips, and trip balances.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use fleetbill_db::{TripRepository, entities::trips};
use fleetbill_shared::types::{ClientId, TripId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ledger_error_response};

/// Creates the trip routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_unbilled_trips))
        .route("/trips/dates", get(list_unbilled_dates))
        .route("/trips/{trip_id}/balance", get(get_trip_balance))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query for unbilled dates.
#[derive(Debug, Deserialize)]
pub struct DatesQuery {
    /// Client to look up.
    pub client_id: Uuid,
}

/// Query for unbilled trips.
#[derive(Debug, Deserialize)]
pub struct TripsQuery {
    /// Client to look up.
    pub client_id: Uuid,
    /// Trip date.
    pub date: NaiveDate,
}

/// Response for a trip.
#[derive(Debug, Serialize)]
pub struct TripResponse {
    /// Trip ID.
    pub id: Uuid,
    /// Client ID.
    pub client_id: Uuid,
    /// Trip date.
    pub date: NaiveDate,
    /// Pickup location.
    pub origin: Option<String>,
    /// Drop location.
    pub destination: Option<String>,
    /// Vehicle registration.
    pub vehicle_no: Option<String>,
    /// Billable amount.
    pub total_amount: Decimal,
    /// Invoice that consumed the trip, if any.
    pub invoice_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<trips::Model> for TripResponse {
    fn from(trip: trips::Model) -> Self {
        Self {
            id: trip.id,
            client_id: trip.client_id,
            date: trip.trip_date,
            origin: trip.origin,
            destination: trip.destination,
            vehicle_no: trip.vehicle_no,
            total_amount: trip.total_amount,
            invoice_id: trip.invoice_id,
            created_at: trip.created_at,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/trips/dates?client_id=` - Dates with un-invoiced trips, ascending.
async fn list_unbilled_dates(
    State(state): State<AppState>,
    Query(query): Query<DatesQuery>,
) -> impl IntoResponse {
    let repo = TripRepository::new((*state.db).clone());

    match repo
        .list_unbilled_dates(ClientId::from_uuid(query.client_id))
        .await
    {
        Ok(dates) => (StatusCode::OK, Json(dates)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/trips?client_id=&date=` - Un-invoiced trips for a client on a date.
async fn list_unbilled_trips(
    State(state): State<AppState>,
    Query(query): Query<TripsQuery>,
) -> impl IntoResponse {
    let repo = TripRepository::new((*state.db).clone());

    match repo
        .list_unbilled_trips(ClientId::from_uuid(query.client_id), query.date)
        .await
    {
        Ok(trips) => {
            let response: Vec<TripResponse> = trips.into_iter().map(TripResponse::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/trips/{trip_id}/balance` - Trip-level balance.
async fn get_trip_balance(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TripRepository::new((*state.db).clone());

    match repo.get_balance(TripId::from_uuid(trip_id)).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}
