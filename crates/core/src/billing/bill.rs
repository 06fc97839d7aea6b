//! Bill generation from invoices.

use chrono::{Days, NaiveDate};
use fleetbill_shared::types::InvoiceId;
use rust_decimal::Decimal;

use super::error::BillingError;
use super::types::Balance;

/// A validated bill ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDraft {
    /// Invoice this bill is derived from.
    pub invoice_id: InvoiceId,
    /// Date the bill was issued.
    pub bill_date: NaiveDate,
    /// Date payment is due.
    pub due_date: NaiveDate,
    /// Opening balance (nothing paid).
    pub balance: Balance,
}

/// Derives bills from invoices (1:1).
pub struct BillGenerator;

impl BillGenerator {
    /// Default due date: `bill_date + grace_days`.
    #[must_use]
    pub fn default_due_date(bill_date: NaiveDate, grace_days: u32) -> NaiveDate {
        bill_date
            .checked_add_days(Days::new(u64::from(grace_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Builds the opening state of a bill for an invoice.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidDueDate` if an explicit due date precedes
    /// the bill date.
    pub fn generate(
        invoice_id: InvoiceId,
        invoice_total: Decimal,
        bill_date: NaiveDate,
        due_date: Option<NaiveDate>,
        grace_days: u32,
    ) -> Result<BillDraft, BillingError> {
        let due_date = due_date.unwrap_or_else(|| Self::default_due_date(bill_date, grace_days));

        if due_date < bill_date {
            return Err(BillingError::InvalidDueDate {
                bill_date,
                due_date,
            });
        }

        Ok(BillDraft {
            invoice_id,
            bill_date,
            due_date,
            balance: Balance::unpaid(invoice_total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::PaymentStatus;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_due_date_uses_grace_period() {
        let draft =
            BillGenerator::generate(InvoiceId::new(), dec!(8000.00), date(2025, 1, 10), None, 30)
                .unwrap();

        assert_eq!(draft.due_date, date(2025, 2, 9));
        assert_eq!(draft.balance.payment_status, PaymentStatus::Unpaid);
        assert_eq!(draft.balance.pending_amount, dec!(8000.00));
        assert_eq!(draft.balance.paid_amount, Decimal::ZERO);
    }

    #[test]
    fn test_explicit_due_date_wins() {
        let draft = BillGenerator::generate(
            InvoiceId::new(),
            dec!(10),
            date(2025, 1, 10),
            Some(date(2025, 1, 15)),
            30,
        )
        .unwrap();
        assert_eq!(draft.due_date, date(2025, 1, 15));
    }

    #[test]
    fn test_due_date_before_bill_date_is_rejected() {
        let result = BillGenerator::generate(
            InvoiceId::new(),
            dec!(10),
            date(2025, 1, 10),
            Some(date(2025, 1, 9)),
            30,
        );
        assert!(matches!(result, Err(BillingError::InvalidDueDate { .. })));
    }

    #[test]
    fn test_zero_grace_days() {
        assert_eq!(
            BillGenerator::default_due_date(date(2025, 3, 1), 0),
            date(2025, 3, 1)
        );
    }
}
