//! Payment application against a bill or trip balance.
//!
//! The recorder works on a balance that the caller has already locked; it
//! decides whether the payment fits and what the balance becomes. Persisting
//! the entry and the new balance in one transaction is the store's job.

use fleetbill_shared::types::round_money;
use rust_decimal::Decimal;

use super::error::BillingError;
use super::types::{Balance, EntryKind, PaymentStatus};

/// Result of applying one payment to a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentApplication {
    /// Amount to record, rounded to cents.
    pub amount: Decimal,
    /// Whether this payment cleared the balance.
    pub entry_kind: EntryKind,
    /// Balance after the payment.
    pub balance: Balance,
}

/// Applies payments to balances.
pub struct PaymentRecorder;

impl PaymentRecorder {
    /// Rounds a payment amount to cents and checks it is positive.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidAmount` if the rounded amount is not
    /// greater than zero.
    pub fn validate_amount(amount: Decimal) -> Result<Decimal, BillingError> {
        let rounded = round_money(amount);
        if rounded <= Decimal::ZERO {
            return Err(BillingError::InvalidAmount(amount));
        }
        Ok(rounded)
    }

    /// Applies a payment to a balance.
    ///
    /// The comparison is `round(amount, 2) <= round(pending, 2)`, so sub-cent
    /// noise on either side never causes a false rejection.
    ///
    /// # Errors
    ///
    /// - `BillingError::InvalidAmount` if the amount is not positive
    /// - `BillingError::Overpayment` if the amount exceeds what is pending
    pub fn apply(balance: &Balance, amount: Decimal) -> Result<PaymentApplication, BillingError> {
        Self::apply_covered(balance, None, amount).map(|(applied, _)| applied)
    }

    /// Applies a payment to a balance that also counts toward a covering one.
    ///
    /// A trip that has been billed is covered by its bill: money paid against
    /// the trip is money paid against the bill, so the amount must fit both
    /// pending balances and lands on both.
    ///
    /// # Errors
    ///
    /// - `BillingError::InvalidAmount` if the amount is not positive
    /// - `BillingError::Overpayment` if the amount exceeds either pending amount;
    ///   `max_allowed` is the smaller of the two
    pub fn apply_covered(
        balance: &Balance,
        cover: Option<&Balance>,
        amount: Decimal,
    ) -> Result<(PaymentApplication, Option<Balance>), BillingError> {
        let rounded = Self::validate_amount(amount)?;
        let max_allowed = cover.map_or(balance.max_payable(), |c| {
            balance.max_payable().min(c.max_payable())
        });

        if rounded > max_allowed {
            return Err(BillingError::Overpayment {
                attempted: amount,
                max_allowed,
            });
        }

        let after = Balance::from_paid(balance.total_amount, balance.paid_amount + rounded);
        let entry_kind = if after.payment_status == PaymentStatus::Paid {
            EntryKind::Full
        } else {
            EntryKind::Partial
        };
        let cover_after = cover.map(|c| Balance::from_paid(c.total_amount, c.paid_amount + rounded));

        Ok((
            PaymentApplication {
                amount: rounded,
                entry_kind,
                balance: after,
            },
            cover_after,
        ))
    }

    /// Removes a previously recorded amount from a balance.
    ///
    /// Paid never drops below zero.
    #[must_use]
    pub fn reverse(balance: &Balance, amount: Decimal) -> Balance {
        let paid = (balance.paid_amount - round_money(amount)).max(Decimal::ZERO);
        Balance::from_paid(balance.total_amount, paid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_partial_then_full_payment() {
        let opening = Balance::unpaid(dec!(8000.00));

        let first = PaymentRecorder::apply(&opening, dec!(3000.00)).unwrap();
        assert_eq!(first.balance.paid_amount, dec!(3000.00));
        assert_eq!(first.balance.pending_amount, dec!(5000.00));
        assert_eq!(first.balance.payment_status, PaymentStatus::Partial);
        assert_eq!(first.entry_kind, EntryKind::Partial);

        let second = PaymentRecorder::apply(&first.balance, dec!(5000.00)).unwrap();
        assert_eq!(second.balance.paid_amount, dec!(8000.00));
        assert_eq!(second.balance.pending_amount, dec!(0.00));
        assert_eq!(second.balance.payment_status, PaymentStatus::Paid);
        assert_eq!(second.entry_kind, EntryKind::Full);
    }

    #[test]
    fn test_payment_after_full_settlement_is_overpayment() {
        let settled = Balance::from_paid(dec!(8000), dec!(8000));
        let err = PaymentRecorder::apply(&settled, dec!(0.01)).unwrap_err();
        assert!(matches!(
            err,
            BillingError::Overpayment { attempted, max_allowed }
                if attempted == dec!(0.01) && max_allowed == Decimal::ZERO
        ));
    }

    #[test]
    fn test_sub_cent_noise_is_not_overpayment() {
        let opening = Balance::unpaid(dec!(5000.00));
        let applied = PaymentRecorder::apply(&opening, dec!(4999.999999)).unwrap();
        assert_eq!(applied.amount, dec!(5000.00));
        assert_eq!(applied.balance.payment_status, PaymentStatus::Paid);
        assert_eq!(applied.balance.pending_amount, Decimal::ZERO);
    }

    #[test]
    fn test_overpayment_reports_limits() {
        let balance = Balance::unpaid(dec!(100));
        let err = PaymentRecorder::apply(&balance, dec!(120)).unwrap_err();
        assert!(matches!(
            err,
            BillingError::Overpayment { attempted, max_allowed }
                if attempted == dec!(120) && max_allowed == dec!(100)
        ));
    }

    #[test]
    fn test_non_positive_amounts_are_rejected() {
        let balance = Balance::unpaid(dec!(100));
        assert!(matches!(
            PaymentRecorder::apply(&balance, Decimal::ZERO),
            Err(BillingError::InvalidAmount(_))
        ));
        assert!(matches!(
            PaymentRecorder::apply(&balance, dec!(-5)),
            Err(BillingError::InvalidAmount(_))
        ));
        assert!(matches!(
            PaymentRecorder::apply(&balance, dec!(0.004)),
            Err(BillingError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_covered_payment_lands_on_both_balances() {
        let trip = Balance::unpaid(dec!(5000));
        let bill = Balance::unpaid(dec!(8000));

        let (applied, bill_after) =
            PaymentRecorder::apply_covered(&trip, Some(&bill), dec!(5000)).unwrap();

        assert_eq!(applied.balance.payment_status, PaymentStatus::Paid);
        assert_eq!(applied.entry_kind, EntryKind::Full);
        let bill_after = bill_after.unwrap();
        assert_eq!(bill_after.paid_amount, dec!(5000));
        assert_eq!(bill_after.pending_amount, dec!(3000));
        assert_eq!(bill_after.payment_status, PaymentStatus::Partial);
    }

    #[test]
    fn test_covered_payment_is_capped_by_the_smaller_pending() {
        // Bill already mostly paid at bill level; the trip itself is untouched
        let trip = Balance::unpaid(dec!(5000));
        let bill = Balance::from_paid(dec!(8000), dec!(7000));

        let err = PaymentRecorder::apply_covered(&trip, Some(&bill), dec!(5000)).unwrap_err();
        assert!(matches!(
            err,
            BillingError::Overpayment { max_allowed, .. } if max_allowed == dec!(1000)
        ));

        let (applied, bill_after) =
            PaymentRecorder::apply_covered(&trip, Some(&bill), dec!(1000)).unwrap();
        assert_eq!(applied.balance.pending_amount, dec!(4000));
        assert_eq!(bill_after.unwrap().payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_uncovered_payment_has_no_cover_balance() {
        let (applied, cover) =
            PaymentRecorder::apply_covered(&Balance::unpaid(dec!(10)), None, dec!(4)).unwrap();
        assert_eq!(applied.balance.paid_amount, dec!(4));
        assert!(cover.is_none());
    }

    #[test]
    fn test_reverse_restores_pending() {
        let balance = Balance::from_paid(dec!(8000), dec!(8000));
        let reversed = PaymentRecorder::reverse(&balance, dec!(5000));
        assert_eq!(reversed.paid_amount, dec!(3000));
        assert_eq!(reversed.pending_amount, dec!(5000));
        assert_eq!(reversed.payment_status, PaymentStatus::Partial);

        let floored = PaymentRecorder::reverse(&reversed, dec!(9999));
        assert_eq!(floored.paid_amount, Decimal::ZERO);
        assert_eq!(floored.payment_status, PaymentStatus::Unpaid);
    }
}
