//! Billing error types.
//!
//! Errors fall into three groups: validation errors the caller can fix,
//! conflicts the caller may retry or abort, and missing targets. None of them
//! leave partial effects behind.

use fleetbill_shared::types::{InvoiceId, PaymentEntryId, TripId};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::TargetType;

/// Why a trip was rejected from an invoice selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionIssue {
    /// The trip does not exist.
    NotFound,
    /// The trip belongs to another client.
    WrongClient,
    /// The trip was performed on another date.
    WrongDate,
    /// The trip is already part of an invoice.
    AlreadyInvoiced,
    /// The trip was listed more than once.
    Duplicate,
}

impl SelectionIssue {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::WrongClient => "wrong_client",
            Self::WrongDate => "wrong_date",
            Self::AlreadyInvoiced => "already_invoiced",
            Self::Duplicate => "duplicate",
        }
    }
}

/// Coarse error category used for propagation and HTTP mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-fixable input problem.
    Validation,
    /// State conflict; see `is_retryable`.
    Conflict,
    /// Referenced record does not exist.
    NotFound,
    /// Infrastructure failure.
    Internal,
}

/// Errors that can occur during billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    // ========== Validation Errors ==========
    /// No trips were selected.
    #[error("Trip selection is empty")]
    EmptySelection,

    /// One or more selected trips cannot be invoiced.
    #[error("Invalid trip selection: {} trip(s) rejected", .rejected.len())]
    InvalidSelection {
        /// Offending trips with the reason each one was rejected.
        rejected: Vec<(TripId, SelectionIssue)>,
    },

    /// Unknown or inapplicable payment status.
    #[error("Invalid payment status: {0}")]
    InvalidStatus(String),

    /// Unknown payment mode.
    #[error("Invalid payment mode: {0}")]
    InvalidPaymentMode(String),

    /// Payment amount must be positive.
    #[error("Payment amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    /// Due date precedes bill date.
    #[error("Due date {due_date} is before bill date {bill_date}")]
    InvalidDueDate {
        /// Requested bill date.
        bill_date: chrono::NaiveDate,
        /// Requested due date.
        due_date: chrono::NaiveDate,
    },

    // ========== Conflict Errors ==========
    /// Payment would exceed the pending amount.
    #[error("Payment of {attempted} exceeds pending amount {max_allowed}")]
    Overpayment {
        /// Amount the caller tried to pay.
        attempted: Decimal,
        /// Largest amount that would have been accepted.
        max_allowed: Decimal,
    },

    /// The invoice already has a bill.
    #[error("Bill already exists for invoice {0}")]
    BillAlreadyExists(InvoiceId),

    /// Lost a race or timed out waiting for a row lock.
    #[error("Concurrent update detected, please retry")]
    ConcurrentUpdate,

    // ========== Not-Found Errors ==========
    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Bill or trip not found.
    #[error("{target_type} not found: {id}")]
    TargetNotFound {
        /// Kind of record looked up.
        target_type: TargetType,
        /// Record ID.
        id: Uuid,
    },

    /// Payment entry not found.
    #[error("Payment entry not found: {0}")]
    PaymentEntryNotFound(PaymentEntryId),

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Shorthand for a missing bill.
    #[must_use]
    pub fn bill_not_found(id: impl Into<Uuid>) -> Self {
        Self::TargetNotFound {
            target_type: TargetType::Bill,
            id: id.into(),
        }
    }

    /// Shorthand for a missing trip.
    #[must_use]
    pub fn trip_not_found(id: impl Into<Uuid>) -> Self {
        Self::TargetNotFound {
            target_type: TargetType::Trip,
            id: id.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySelection
            | Self::InvalidSelection { .. }
            | Self::InvalidStatus(_)
            | Self::InvalidPaymentMode(_)
            | Self::InvalidAmount(_)
            | Self::InvalidDueDate { .. } => ErrorKind::Validation,
            Self::Overpayment { .. } | Self::BillAlreadyExists(_) | Self::ConcurrentUpdate => {
                ErrorKind::Conflict
            }
            Self::InvoiceNotFound(_)
            | Self::TargetNotFound { .. }
            | Self::PaymentEntryNotFound(_) => ErrorKind::NotFound,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::InvalidSelection { .. } => "INVALID_SELECTION",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::InvalidPaymentMode(_) => "INVALID_PAYMENT_MODE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidDueDate { .. } => "INVALID_DUE_DATE",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::BillAlreadyExists(_) => "BILL_ALREADY_EXISTS",
            Self::ConcurrentUpdate => "CONCURRENT_UPDATE",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::TargetNotFound { .. } => "TARGET_NOT_FOUND",
            Self::PaymentEntryNotFound(_) => "PAYMENT_ENTRY_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::EmptySelection
            | Self::InvalidSelection { .. }
            | Self::InvalidStatus(_)
            | Self::InvalidPaymentMode(_)
            | Self::InvalidAmount(_)
            | Self::InvalidDueDate { .. } => 400,

            // 404 Not Found
            Self::InvoiceNotFound(_) | Self::TargetNotFound { .. } | Self::PaymentEntryNotFound(_) => {
                404
            }

            // 409 Conflict
            Self::BillAlreadyExists(_) | Self::ConcurrentUpdate => 409,

            // 422 Unprocessable - balance rule violation
            Self::Overpayment { .. } => 422,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if the caller may retry the same request with backoff.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentUpdate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(BillingError::EmptySelection.error_code(), "EMPTY_SELECTION");
        assert_eq!(
            BillingError::Overpayment {
                attempted: dec!(0.01),
                max_allowed: dec!(0),
            }
            .error_code(),
            "OVERPAYMENT"
        );
        assert_eq!(BillingError::ConcurrentUpdate.error_code(), "CONCURRENT_UPDATE");
        assert_eq!(
            BillingError::bill_not_found(Uuid::nil()).error_code(),
            "TARGET_NOT_FOUND"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(BillingError::EmptySelection.http_status_code(), 400);
        assert_eq!(
            BillingError::InvalidStatus("X".to_string()).http_status_code(),
            400
        );
        assert_eq!(
            BillingError::InvoiceNotFound(InvoiceId::from_uuid(Uuid::nil())).http_status_code(),
            404
        );
        assert_eq!(
            BillingError::BillAlreadyExists(InvoiceId::from_uuid(Uuid::nil())).http_status_code(),
            409
        );
        assert_eq!(BillingError::ConcurrentUpdate.http_status_code(), 409);
        assert_eq!(
            BillingError::Overpayment {
                attempted: dec!(1),
                max_allowed: dec!(0),
            }
            .http_status_code(),
            422
        );
        assert_eq!(
            BillingError::Database("boom".to_string()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(BillingError::EmptySelection.kind(), ErrorKind::Validation);
        assert_eq!(BillingError::ConcurrentUpdate.kind(), ErrorKind::Conflict);
        assert_eq!(
            BillingError::trip_not_found(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BillingError::Internal(String::new()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_only_concurrent_update_is_retryable() {
        assert!(BillingError::ConcurrentUpdate.is_retryable());
        assert!(
            !BillingError::Overpayment {
                attempted: dec!(60),
                max_allowed: dec!(40),
            }
            .is_retryable()
        );
        assert!(!BillingError::EmptySelection.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = BillingError::Overpayment {
            attempted: dec!(60.00),
            max_allowed: dec!(40.00),
        };
        assert_eq!(err.to_string(), "Payment of 60.00 exceeds pending amount 40.00");

        let err = BillingError::TargetNotFound {
            target_type: TargetType::Trip,
            id: Uuid::nil(),
        };
        assert_eq!(
            err.to_string(),
            "TRIP not found: 00000000-0000-0000-0000-000000000000"
        );

        let err = BillingError::InvalidSelection {
            rejected: vec![
                (TripId::from_uuid(Uuid::nil()), SelectionIssue::WrongDate),
                (TripId::from_uuid(Uuid::nil()), SelectionIssue::AlreadyInvoiced),
            ],
        };
        assert_eq!(err.to_string(), "Invalid trip selection: 2 trip(s) rejected");
    }
}
