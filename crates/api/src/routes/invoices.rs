//! Invoice routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use fleetbill_db::InvoiceRepository;
use fleetbill_shared::types::{ClientId, InvoiceId, TripId};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ledger_error_response};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(create_invoice))
        .route("/invoices/{invoice_id}", get(get_invoice))
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Client being invoiced.
    pub client_id: Uuid,
    /// Trip date bucket.
    pub date: NaiveDate,
    /// Trips to claim.
    pub trip_ids: Vec<Uuid>,
}

/// POST `/invoices` - Claim trips and create an invoice.
async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone(), state.billing);
    let trip_ids: Vec<TripId> = request.trip_ids.into_iter().map(TripId::from_uuid).collect();

    match repo
        .create_invoice(ClientId::from_uuid(request.client_id), request.date, &trip_ids)
        .await
    {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/invoices/{invoice_id}` - Invoice with its trip IDs.
async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone(), state.billing);

    match repo.get_invoice(InvoiceId::from_uuid(invoice_id)).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}
