//! Summary aggregation.

use chrono::NaiveDate;
use fleetbill_shared::types::round_money;
use rust_decimal::Decimal;

use super::types::{BillSnapshot, Summary, SummaryFilter};

/// Aggregates collection totals.
pub struct SummaryService;

impl SummaryService {
    /// Computes totals over the bills that pass `filter` on `today`.
    ///
    /// An empty selection yields an all-zero summary.
    #[must_use]
    pub fn summarize(bills: &[BillSnapshot], filter: &SummaryFilter, today: NaiveDate) -> Summary {
        let mut summary = Summary::default();

        for bill in bills.iter().filter(|b| filter.matches(b, today)) {
            summary.count += 1;
            summary.total_billed += bill.balance.total_amount;
            summary.total_received += bill.balance.paid_amount;
            summary.total_pending += bill.balance.pending_amount;

            if bill.overdue(today).is_overdue {
                summary.overdue_count += 1;
                summary.overdue_amount += bill.balance.pending_amount;
            }
        }

        summary.total_billed = round_money(summary.total_billed);
        summary.total_received = round_money(summary.total_received);
        summary.total_pending = round_money(summary.total_pending);
        summary.overdue_amount = round_money(summary.overdue_amount);
        summary.collection_rate =
            Self::collection_rate(summary.total_received, summary.total_billed);
        summary
    }

    /// `received / billed * 100`, rounded to cents; zero when nothing was billed.
    #[must_use]
    pub fn collection_rate(received: Decimal, billed: Decimal) -> Decimal {
        if billed.is_zero() {
            return round_money(Decimal::ZERO);
        }
        round_money(received * Decimal::ONE_HUNDRED / billed)
    }
}
