//! Bill routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use fleetbill_core::billing::{BillingError, PaymentMode, PaymentStatus};
use fleetbill_core::summary::{DateRange, SummaryFilter};
use fleetbill_db::BillRepository;
use fleetbill_shared::types::{BillId, ClientId, InvoiceId};
use serde::Deserialize;
use uuid::Uuid;

use super::today;
use crate::{
    AppState,
    error::{billing_error_response, ledger_error_response},
};

/// Creates the bill routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bills", post(create_bill).get(list_bills))
        .route("/bills/{bill_id}", get(get_bill).delete(delete_bill))
        .route("/bills/{bill_id}/status", patch(update_bill_status))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a bill.
#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    /// Invoice to bill.
    pub invoice_id: Uuid,
    /// Issue date.
    pub bill_date: NaiveDate,
    /// Due date; defaults to the configured grace period.
    pub due_date: Option<NaiveDate>,
}

/// Request body for a manual status override.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Requested status: UNPAID, PARTIAL, or PAID.
    pub payment_status: String,
    /// Remarks stored on the settling adjustment entry.
    pub remarks: Option<String>,
}

/// Bill filter shared by the bill listing and the summary.
#[derive(Debug, Default, Deserialize)]
pub struct BillFilterQuery {
    /// Only this client.
    pub client_id: Option<Uuid>,
    /// First bill date included.
    pub from: Option<NaiveDate>,
    /// Last bill date included.
    pub to: Option<NaiveDate>,
    /// Only bills in this status.
    pub status: Option<String>,
    /// Only bills paid at least once in this mode.
    pub mode: Option<String>,
    /// Only overdue bills.
    #[serde(default)]
    pub overdue_only: bool,
    /// Day to evaluate overdue flags on; defaults to today.
    pub as_of: Option<NaiveDate>,
}

impl BillFilterQuery {
    /// Parses the query into a filter and the evaluation day.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` or `InvalidPaymentMode` for unknown values.
    pub fn into_filter(self) -> Result<(SummaryFilter, NaiveDate), BillingError> {
        let date_range = DateRange {
            from: self.from,
            to: self.to,
        };

        let filter = SummaryFilter {
            client_id: self.client_id.map(ClientId::from_uuid),
            date_range: (!date_range.is_unbounded()).then_some(date_range),
            status: self
                .status
                .as_deref()
                .map(str::parse::<PaymentStatus>)
                .transpose()?,
            mode: self
                .mode
                .as_deref()
                .map(str::parse::<PaymentMode>)
                .transpose()?,
            overdue_only: self.overdue_only,
        };

        Ok((filter, today(self.as_of)))
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/bills` - Create the bill for an invoice.
async fn create_bill(
    State(state): State<AppState>,
    Json(request): Json<CreateBillRequest>,
) -> impl IntoResponse {
    let repo = BillRepository::new((*state.db).clone(), state.billing);

    match repo
        .create_bill(
            InvoiceId::from_uuid(request.invoice_id),
            request.bill_date,
            request.due_date,
        )
        .await
    {
        Ok(bill) => (StatusCode::CREATED, Json(bill.view(today(None)))).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/bills` - Bills matching the filter, with overdue flags.
async fn list_bills(
    State(state): State<AppState>,
    Query(query): Query<BillFilterQuery>,
) -> impl IntoResponse {
    let (filter, today) = match query.into_filter() {
        Ok(parsed) => parsed,
        Err(e) => return billing_error_response(&e),
    };
    let repo = BillRepository::new((*state.db).clone(), state.billing);

    match repo.list_bills(&filter, today).await {
        Ok(bills) => {
            let views: Vec<_> = bills.iter().map(|b| b.view(today)).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/bills/{bill_id}` - One bill with overdue flags.
async fn get_bill(State(state): State<AppState>, Path(bill_id): Path<Uuid>) -> impl IntoResponse {
    let repo = BillRepository::new((*state.db).clone(), state.billing);

    match repo.get_bill(BillId::from_uuid(bill_id)).await {
        Ok(bill) => (StatusCode::OK, Json(bill.view(today(None)))).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// PATCH `/bills/{bill_id}/status` - Manual status override.
async fn update_bill_status(
    State(state): State<AppState>,
    Path(bill_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    let requested = match request.payment_status.parse::<PaymentStatus>() {
        Ok(status) => status,
        Err(e) => return billing_error_response(&e),
    };
    let repo = BillRepository::new((*state.db).clone(), state.billing);

    match repo
        .update_status(BillId::from_uuid(bill_id), requested, request.remarks)
        .await
    {
        Ok(bill) => (StatusCode::OK, Json(bill.view(today(None)))).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// DELETE `/bills/{bill_id}` - Hard delete; trips stay invoiced.
async fn delete_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = BillRepository::new((*state.db).clone(), state.billing);

    match repo.delete_bill(BillId::from_uuid(bill_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ledger_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filter_query_parses_every_field() {
        let client = Uuid::now_v7();
        let query = BillFilterQuery {
            client_id: Some(client),
            from: Some(date(2025, 1, 1)),
            to: None,
            status: Some("partial".to_string()),
            mode: Some("UPI".to_string()),
            overdue_only: true,
            as_of: Some(date(2025, 3, 1)),
        };

        let (filter, today) = query.into_filter().unwrap();
        assert_eq!(filter.client_id, Some(ClientId::from_uuid(client)));
        assert_eq!(filter.date_range.and_then(|r| r.from), Some(date(2025, 1, 1)));
        assert_eq!(filter.status, Some(PaymentStatus::Partial));
        assert_eq!(filter.mode, Some(PaymentMode::Upi));
        assert!(filter.overdue_only);
        assert_eq!(today, date(2025, 3, 1));
    }

    #[test]
    fn test_empty_filter_query_matches_everything() {
        let (filter, _) = BillFilterQuery::default().into_filter().unwrap();
        assert_eq!(filter, SummaryFilter::default());
    }

    #[test]
    fn test_filter_query_rejects_unknown_values() {
        let bad_status = BillFilterQuery {
            status: Some("SETTLED".to_string()),
            ..BillFilterQuery::default()
        };
        assert!(matches!(
            bad_status.into_filter(),
            Err(BillingError::InvalidStatus(_))
        ));

        let bad_mode = BillFilterQuery {
            mode: Some("barter".to_string()),
            ..BillFilterQuery::default()
        };
        assert!(matches!(
            bad_mode.into_filter(),
            Err(BillingError::InvalidPaymentMode(_))
        ));
    }
}
