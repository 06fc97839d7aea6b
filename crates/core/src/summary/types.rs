//! Summary and bill view types.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use fleetbill_shared::types::{BillId, ClientId, InvoiceId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::billing::{Balance, PaymentMode, PaymentStatus, StatusDeriver};

/// Inclusive bill-date window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First bill date included.
    pub from: Option<NaiveDate>,
    /// Last bill date included.
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Returns true if `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    /// Returns true if no bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Which bills a summary or listing covers.
///
/// Every field narrows the set; an all-`None` filter with `overdue_only = false`
/// selects every bill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryFilter {
    /// Only bills whose invoice belongs to this client.
    pub client_id: Option<ClientId>,
    /// Only bills issued inside this window.
    pub date_range: Option<DateRange>,
    /// Only bills currently in this status.
    pub status: Option<PaymentStatus>,
    /// Only bills that received at least one payment in this mode.
    pub mode: Option<PaymentMode>,
    /// Only bills that are overdue on the evaluation day.
    pub overdue_only: bool,
}

impl SummaryFilter {
    /// Returns true if the bill passes every filter on `today`.
    #[must_use]
    pub fn matches(&self, bill: &BillSnapshot, today: NaiveDate) -> bool {
        if self.client_id.is_some_and(|c| c != bill.client_id) {
            return false;
        }
        if self.date_range.is_some_and(|r| !r.contains(bill.bill_date)) {
            return false;
        }
        if self.status.is_some_and(|s| s != bill.balance.payment_status) {
            return false;
        }
        if self.mode.is_some_and(|m| !bill.payment_modes.contains(&m)) {
            return false;
        }
        !self.overdue_only || bill.overdue(today).is_overdue
    }
}

/// A bill as read from the ledger, with the modes it was paid in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillSnapshot {
    /// Bill ID.
    pub id: BillId,
    /// Invoice the bill was derived from.
    pub invoice_id: InvoiceId,
    /// Client of the underlying invoice.
    pub client_id: ClientId,
    /// Issue date.
    pub bill_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Current balance.
    pub balance: Balance,
    /// Distinct payment modes recorded against the bill.
    pub payment_modes: BTreeSet<PaymentMode>,
}

impl BillSnapshot {
    /// Overdue flag for `today`.
    #[must_use]
    pub fn overdue(&self, today: NaiveDate) -> crate::billing::Overdue {
        StatusDeriver::overdue(self.balance.payment_status, self.due_date, today)
    }

    /// Renders the bill with its derived overdue fields.
    #[must_use]
    pub fn view(&self, today: NaiveDate) -> BillView {
        let overdue = self.overdue(today);
        BillView {
            id: self.id,
            invoice_id: self.invoice_id,
            client_id: self.client_id,
            bill_date: self.bill_date,
            due_date: self.due_date,
            total_amount: self.balance.total_amount,
            paid_amount: self.balance.paid_amount,
            pending_amount: self.balance.pending_amount,
            payment_status: self.balance.payment_status,
            is_overdue: overdue.is_overdue,
            overdue_days: overdue.overdue_days,
        }
    }
}

/// Bill as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillView {
    /// Bill ID.
    pub id: BillId,
    /// Invoice ID.
    pub invoice_id: InvoiceId,
    /// Client ID.
    pub client_id: ClientId,
    /// Issue date.
    pub bill_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Frozen invoice total.
    pub total_amount: Decimal,
    /// Received so far.
    pub paid_amount: Decimal,
    /// Still owed.
    pub pending_amount: Decimal,
    /// Derived status.
    pub payment_status: PaymentStatus,
    /// Unpaid past the due date.
    pub is_overdue: bool,
    /// Days past the due date.
    pub overdue_days: i64,
}

/// Collection totals over a filtered set of bills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of bills matched.
    pub count: u64,
    /// Sum of bill totals.
    pub total_billed: Decimal,
    /// Sum of paid amounts.
    pub total_received: Decimal,
    /// Sum of pending amounts.
    pub total_pending: Decimal,
    /// Received as a percentage of billed, 0 when nothing was billed.
    pub collection_rate: Decimal,
    /// Number of matched bills that are overdue.
    pub overdue_count: u64,
    /// Pending amount across the overdue bills.
    pub overdue_amount: Decimal,
}
