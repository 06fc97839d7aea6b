//! Property-based tests for balance bookkeeping.
//!
//! - Conservation: paid + pending == total after any sequence of payments
//! - Status correctness: status always matches paid vs. total
//! - Overpayment rejection: oversized payments fail and leave the balance unchanged
//! - Covered payments: a bill never collects more than its total, however its
//!   trips and the bill itself are paid

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::BillingError;
use super::payment::PaymentRecorder;
use super::status::StatusDeriver;
use super::types::{Balance, PaymentStatus};
use fleetbill_shared::types::{MONEY_TOLERANCE, round_money};

/// Strategy to generate positive decimal amounts (0.01 to 100,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate amounts with sub-cent noise (6 decimal places).
fn noisy_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000_000i64).prop_map(|micros| Decimal::new(micros, 6))
}

fn assert_status_matches(balance: &Balance) -> Result<(), TestCaseError> {
    let expected = if balance.paid_amount >= balance.total_amount {
        PaymentStatus::Paid
    } else if balance.paid_amount.is_zero() {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Partial
    };
    prop_assert_eq!(balance.payment_status, expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any sequence of accepted payments keeps paid + pending == total.
    #[test]
    fn prop_payments_conserve_total(
        total in positive_amount(),
        payments in prop::collection::vec(noisy_amount(), 1..20),
    ) {
        let mut balance = Balance::unpaid(total);

        for amount in payments {
            match PaymentRecorder::apply(&balance, amount) {
                Ok(applied) => balance = applied.balance,
                Err(BillingError::Overpayment { .. } | BillingError::InvalidAmount(_)) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
            prop_assert!(balance.is_conserved());
            prop_assert!((balance.paid_amount + balance.pending_amount - balance.total_amount).abs() <= MONEY_TOLERANCE);
            prop_assert!(balance.pending_amount >= Decimal::ZERO);
            assert_status_matches(&balance)?;
        }
    }

    /// Status is PAID iff paid >= total, UNPAID iff paid == 0, else PARTIAL.
    #[test]
    fn prop_status_matches_amounts(
        total in positive_amount(),
        paid_cents in 0i64..10_000_000i64,
    ) {
        let paid = Decimal::new(paid_cents, 2);
        let balance = Balance::from_paid(total, paid);
        assert_status_matches(&balance)?;
        prop_assert_eq!(balance.payment_status, StatusDeriver::derive(paid, total));
    }

    /// Paying more than pending always fails and reports the real limit.
    #[test]
    fn prop_overpayment_rejected(
        total in positive_amount(),
        paid_fraction in 0u32..=100u32,
        excess in positive_amount(),
    ) {
        let paid = round_money(total * Decimal::from(paid_fraction) / Decimal::from(100));
        let balance = Balance::from_paid(total, paid);
        let attempted = balance.pending_amount + excess;

        let result = PaymentRecorder::apply(&balance, attempted);

        match result {
            Err(BillingError::Overpayment { attempted: a, max_allowed }) => {
                prop_assert_eq!(a, attempted);
                prop_assert_eq!(max_allowed, balance.pending_amount);
            }
            other => prop_assert!(false, "expected overpayment, got {other:?}"),
        }
    }

    /// Paying exactly the pending amount always settles the balance.
    #[test]
    fn prop_exact_pending_settles(
        total in positive_amount(),
        first_pct in 1u32..100u32,
    ) {
        let first = round_money(total * Decimal::from(first_pct) / Decimal::from(100));
        prop_assume!(first > Decimal::ZERO && first < round_money(total));
        let after_first = PaymentRecorder::apply(&Balance::unpaid(total), first).unwrap().balance;
        let settled = PaymentRecorder::apply(&after_first, after_first.pending_amount).unwrap().balance;

        prop_assert_eq!(settled.payment_status, PaymentStatus::Paid);
        prop_assert_eq!(settled.pending_amount, Decimal::ZERO);
        prop_assert_eq!(settled.paid_amount, round_money(total));
    }

    /// Two payments that together exceed the total cannot both apply in sequence.
    #[test]
    fn prop_serialized_payments_never_overpay(
        total in positive_amount(),
        first_pct in 0u32..=100u32,
        excess in positive_amount(),
    ) {
        let a = round_money(total * Decimal::from(first_pct) / Decimal::from(100)).max(Decimal::new(1, 2));
        let b = total - a + excess;
        let opening = Balance::unpaid(total);

        let first = PaymentRecorder::apply(&opening, a).unwrap().balance;
        let second = PaymentRecorder::apply(&first, b);

        let is_overpayment = matches!(second, Err(BillingError::Overpayment { .. }));
        prop_assert!(is_overpayment);
        prop_assert!(first.paid_amount <= first.total_amount);
    }

    /// Mixed trip-level and bill-level payments never push a bill past its total.
    #[test]
    fn prop_covered_payments_never_overcollect(
        trip_total in positive_amount(),
        other_trips in positive_amount(),
        payments in prop::collection::vec((any::<bool>(), noisy_amount()), 1..20),
    ) {
        let mut trip = Balance::unpaid(trip_total);
        let mut bill = Balance::unpaid(trip_total + other_trips);

        for (on_trip, amount) in payments {
            if on_trip {
                match PaymentRecorder::apply_covered(&trip, Some(&bill), amount) {
                    Ok((applied, Some(cover))) => {
                        trip = applied.balance;
                        bill = cover;
                    }
                    Ok((_, None)) => prop_assert!(false, "covered payment lost its bill"),
                    Err(BillingError::Overpayment { .. } | BillingError::InvalidAmount(_)) => {}
                    Err(other) => prop_assert!(false, "unexpected error: {other}"),
                }
            } else {
                match PaymentRecorder::apply(&bill, amount) {
                    Ok(applied) => bill = applied.balance,
                    Err(BillingError::Overpayment { .. } | BillingError::InvalidAmount(_)) => {}
                    Err(other) => prop_assert!(false, "unexpected error: {other}"),
                }
            }

            prop_assert!(bill.paid_amount <= bill.total_amount);
            prop_assert!(trip.paid_amount <= trip.total_amount);
            prop_assert!(trip.paid_amount <= bill.paid_amount);
            prop_assert!(bill.is_conserved());
            prop_assert!(trip.is_conserved());
            assert_status_matches(&bill)?;
        }
    }
}
