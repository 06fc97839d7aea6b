//! Payment routes: recording, history, deletion, and collection summary.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use fleetbill_core::billing::{PaymentMode, PaymentStatus, TargetType};
use fleetbill_db::{
    PaymentRepository, SummaryRepository,
    repositories::{PaymentReceipt, RecordPaymentInput},
};
use fleetbill_shared::types::PaymentEntryId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bills::BillFilterQuery;
use crate::{
    AppState,
    error::{billing_error_response, ledger_error_response},
};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(record_payment).get(list_payments))
        .route("/payments/summary", get(get_summary))
        .route("/payments/{entry_id}", delete(delete_payment))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for recording a payment.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    /// BILL or TRIP.
    pub target_type: TargetType,
    /// Bill or trip ID.
    pub target_id: Uuid,
    /// Amount paid, as a decimal string or number.
    pub amount: Decimal,
    /// Payment mode, e.g. UPI, CASH, BANK_TRANSFER.
    pub mode: String,
    /// External reference.
    pub reference_no: Option<String>,
    /// Free-form remarks.
    pub remarks: Option<String>,
}

/// Query for payment history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// BILL or TRIP.
    pub target_type: TargetType,
    /// Bill or trip ID.
    pub target_id: Uuid,
}

/// Balance after a recorded payment.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// ID of the appended entry.
    pub entry_id: PaymentEntryId,
    /// Target total.
    pub total_amount: Decimal,
    /// Paid so far.
    pub paid_amount: Decimal,
    /// Still owed.
    pub pending_amount: Decimal,
    /// Derived status.
    pub payment_status: PaymentStatus,
}

impl From<PaymentReceipt> for PaymentResponse {
    fn from(receipt: PaymentReceipt) -> Self {
        Self {
            entry_id: receipt.entry.id,
            total_amount: receipt.balance.total_amount,
            paid_amount: receipt.balance.paid_amount,
            pending_amount: receipt.balance.pending_amount,
            payment_status: receipt.balance.payment_status,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/payments` - Record a payment against a bill or trip.
async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> impl IntoResponse {
    let mode = match request.mode.parse::<PaymentMode>() {
        Ok(mode) => mode,
        Err(e) => return billing_error_response(&e),
    };
    let repo = PaymentRepository::new((*state.db).clone(), state.billing);

    let input = RecordPaymentInput {
        target_type: request.target_type,
        target_id: request.target_id,
        amount: request.amount,
        mode,
        reference_no: request.reference_no,
        remarks: request.remarks,
    };

    match repo.record_payment(input).await {
        Ok(receipt) => (StatusCode::CREATED, Json(PaymentResponse::from(receipt))).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/payments?target_type=&target_id=` - Payment history, newest first.
async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone(), state.billing);

    match repo.list_entries(query.target_type, query.target_id).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// DELETE `/payments/{entry_id}` - Remove an entry and reverse its amount.
async fn delete_payment(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone(), state.billing);

    match repo.delete_entry(PaymentEntryId::from_uuid(entry_id)).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/payments/summary` - Collection totals over the filtered bills.
async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<BillFilterQuery>,
) -> impl IntoResponse {
    let (filter, today) = match query.into_filter() {
        Ok(parsed) => parsed,
        Err(e) => return billing_error_response(&e),
    };
    let repo = SummaryRepository::new((*state.db).clone());

    match repo.summarize(&filter, today).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}
