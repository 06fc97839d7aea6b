//! Error responses.
//!
//! Every failure is rendered as `{"error": <code>, "message": <text>, "details": {...}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fleetbill_core::billing::{BillingError, ErrorKind};
use fleetbill_db::LedgerError;
use serde_json::{Value, json};
use tracing::{error, warn};

/// Structured details for the errors that carry any.
fn details(err: &BillingError) -> Value {
    match err {
        BillingError::InvalidSelection { rejected } => json!({
            "rejected": rejected
                .iter()
                .map(|(trip_id, issue)| json!({ "trip_id": trip_id, "reason": issue.as_str() }))
                .collect::<Vec<_>>()
        }),
        BillingError::Overpayment {
            attempted,
            max_allowed,
        } => json!({
            "attempted": attempted.to_string(),
            "max_allowed": max_allowed.to_string()
        }),
        BillingError::InvalidAmount(amount) => json!({ "amount": amount.to_string() }),
        BillingError::InvalidDueDate {
            bill_date,
            due_date,
        } => json!({ "bill_date": bill_date, "due_date": due_date }),
        BillingError::BillAlreadyExists(invoice_id) => json!({ "invoice_id": invoice_id }),
        BillingError::InvoiceNotFound(invoice_id) => json!({ "invoice_id": invoice_id }),
        BillingError::TargetNotFound { target_type, id } => {
            json!({ "target_type": target_type, "id": id })
        }
        BillingError::PaymentEntryNotFound(id) => json!({ "id": id }),
        BillingError::ConcurrentUpdate => json!({ "retryable": true }),
        _ => json!({}),
    }
}

/// Renders a billing error as an HTTP response.
pub fn billing_error_response(err: &BillingError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = match err.kind() {
        ErrorKind::Internal => {
            error!(error = %err, "Billing operation failed");
            "An internal error occurred".to_string()
        }
        ErrorKind::Conflict => {
            warn!(error = %err, code = err.error_code(), "Billing conflict");
            err.to_string()
        }
        ErrorKind::Validation | ErrorKind::NotFound => err.to_string(),
    };

    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": message,
            "details": details(err),
        })),
    )
        .into_response()
}

/// Renders a repository error as an HTTP response.
pub fn ledger_error_response(err: LedgerError) -> Response {
    billing_error_response(&BillingError::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetbill_shared::types::TripId;
    use fleetbill_core::billing::SelectionIssue;
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_overpayment_details_are_decimal_strings() {
        let err = BillingError::Overpayment {
            attempted: Decimal::new(1, 2),
            max_allowed: Decimal::ZERO,
        };
        let response = billing_error_response(&err);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "OVERPAYMENT");
        assert_eq!(body["details"]["attempted"], "0.01");
        assert_eq!(body["details"]["max_allowed"], "0");
    }

    #[tokio::test]
    async fn test_invalid_selection_lists_offenders() {
        let trip_id = TripId::new();
        let err = BillingError::InvalidSelection {
            rejected: vec![(trip_id, SelectionIssue::AlreadyInvoiced)],
        };
        let response = billing_error_response(&err);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["details"]["rejected"][0]["trip_id"], trip_id.to_string());
        assert_eq!(body["details"]["rejected"][0]["reason"], "already_invoiced");
    }

    #[tokio::test]
    async fn test_database_errors_hide_internals() {
        let response = billing_error_response(&BillingError::Database("password=hunter2".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_concurrent_update_is_retryable_conflict() {
        let response = billing_error_response(&BillingError::ConcurrentUpdate);
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["details"]["retryable"], true);
    }
}
