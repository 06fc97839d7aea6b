//! Payment status derivation and overdue detection.
//!
//! Status is a pure function of paid vs. total; it is never stored
//! independently of the amounts it is derived from.

use chrono::NaiveDate;
use fleetbill_shared::types::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::types::{Balance, PaymentStatus};

/// Overdue flag and age of a balance on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overdue {
    /// True when unpaid past the due date.
    pub is_overdue: bool,
    /// Days past the due date, zero when not overdue.
    pub overdue_days: i64,
}

/// Outcome of a manual status override request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOverride {
    /// Requested status already matches the balance.
    Unchanged,
    /// Settle the remaining pending amount with an adjustment entry.
    Settle {
        /// Amount the adjustment entry must carry.
        amount: Decimal,
    },
}

/// Derives payment status and overdue flags.
pub struct StatusDeriver;

impl StatusDeriver {
    /// Derives the payment status from paid and total amounts.
    ///
    /// Both sides are rounded to cents first. A zero total counts as paid.
    #[must_use]
    pub fn derive(paid_amount: Decimal, total_amount: Decimal) -> PaymentStatus {
        let paid = round_money(paid_amount);
        let total = round_money(total_amount);

        if paid >= total {
            PaymentStatus::Paid
        } else if paid <= Decimal::ZERO {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Partial
        }
    }

    /// Computes the overdue flag for `today`.
    #[must_use]
    pub fn overdue(status: PaymentStatus, due_date: NaiveDate, today: NaiveDate) -> Overdue {
        if status != PaymentStatus::Paid && today > due_date {
            Overdue {
                is_overdue: true,
                overdue_days: (today - due_date).num_days(),
            }
        } else {
            Overdue {
                is_overdue: false,
                overdue_days: 0,
            }
        }
    }

    /// Plans a manual status override.
    ///
    /// Marking a balance `PAID` settles whatever is pending. Asking for the
    /// status the balance already has is a no-op. Any other request would
    /// contradict the amounts and is rejected.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidStatus` if the requested status cannot
    /// be reached without rewriting history.
    pub fn plan_override(
        balance: &Balance,
        requested: PaymentStatus,
    ) -> Result<StatusOverride, BillingError> {
        if requested == balance.payment_status {
            return Ok(StatusOverride::Unchanged);
        }

        match requested {
            PaymentStatus::Paid => Ok(StatusOverride::Settle {
                amount: balance.max_payable(),
            }),
            PaymentStatus::Unpaid | PaymentStatus::Partial => Err(BillingError::InvalidStatus(
                format!(
                    "cannot move from {} to {requested} without a correcting entry",
                    balance.payment_status
                ),
            )),
        }
    }
}
