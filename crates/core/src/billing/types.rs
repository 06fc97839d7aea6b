//! Billing domain types.
//!
//! Trips are aggregated into invoices, invoices become bills, and payments are
//! recorded against a bill or a single trip. The types here are snapshots of
//! ledger rows plus the derived balance every mutation recomputes.

use chrono::NaiveDate;
use fleetbill_shared::types::{ClientId, InvoiceId, TripId, round_money, within_tolerance};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::BillingError;
use super::status::StatusDeriver;

/// Payment status of a bill or a trip-level balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// Nothing has been paid.
    Unpaid,
    /// Some but not all of the total has been paid.
    Partial,
    /// The total has been paid in full.
    Paid,
}

impl PaymentStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UNPAID" => Ok(Self::Unpaid),
            "PARTIAL" => Ok(Self::Partial),
            "PAID" => Ok(Self::Paid),
            _ => Err(BillingError::InvalidStatus(s.to_string())),
        }
    }
}

/// What a payment is recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetType {
    /// A bill (invoice-level balance).
    Bill,
    /// A single trip (its own balance).
    Trip,
}

impl TargetType {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bill => "BILL",
            Self::Trip => "TRIP",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Cash.
    Cash,
    /// UPI transfer.
    Upi,
    /// Bank transfer (NEFT/RTGS/IMPS).
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Card.
    Card,
    /// Book adjustment, e.g. a manual settlement.
    Adjustment,
}

impl PaymentMode {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Upi => "UPI",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Cheque => "CHEQUE",
            Self::Card => "CARD",
            Self::Adjustment => "ADJUSTMENT",
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace([' ', '-'], "_").as_str() {
            "CASH" => Ok(Self::Cash),
            "UPI" => Ok(Self::Upi),
            "BANK_TRANSFER" | "NEFT" | "RTGS" | "IMPS" => Ok(Self::BankTransfer),
            "CHEQUE" | "CHECK" => Ok(Self::Cheque),
            "CARD" => Ok(Self::Card),
            "ADJUSTMENT" => Ok(Self::Adjustment),
            _ => Err(BillingError::InvalidPaymentMode(s.to_string())),
        }
    }
}

/// Whether a payment entry cleared the pending balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    /// Cleared the full pending amount.
    Full,
    /// Left a pending amount behind.
    Partial,
}

/// A trip as seen by the invoice builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSnapshot {
    /// Trip ID.
    pub id: TripId,
    /// Client the trip was performed for.
    pub client_id: ClientId,
    /// Date of the trip.
    pub trip_date: NaiveDate,
    /// Billable amount.
    pub total_amount: Decimal,
    /// Invoice that consumed this trip, if any.
    pub invoice_id: Option<InvoiceId>,
}

impl TripSnapshot {
    /// Returns true once the trip belongs to an invoice.
    #[must_use]
    pub const fn is_invoiced(&self) -> bool {
        self.invoice_id.is_some()
    }
}

/// Total, paid, and pending amounts with the status derived from them.
///
/// Invariant: `paid_amount + pending_amount == total_amount` within
/// [`fleetbill_shared::types::MONEY_TOLERANCE`], and `payment_status` is
/// always `StatusDeriver::derive(paid_amount, total_amount)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Amount owed in total.
    pub total_amount: Decimal,
    /// Amount received so far.
    pub paid_amount: Decimal,
    /// Amount still owed.
    pub pending_amount: Decimal,
    /// Derived payment status.
    pub payment_status: PaymentStatus,
}

impl Balance {
    /// Creates an unpaid balance for the given total.
    #[must_use]
    pub fn unpaid(total_amount: Decimal) -> Self {
        Self::from_paid(total_amount, Decimal::ZERO)
    }

    /// Derives pending amount and status from a total and a paid amount.
    ///
    /// Pending is clamped to zero so rounding noise can never make it negative.
    #[must_use]
    pub fn from_paid(total_amount: Decimal, paid_amount: Decimal) -> Self {
        let total_amount = round_money(total_amount);
        let paid_amount = round_money(paid_amount);
        let pending_amount = round_money((total_amount - paid_amount).max(Decimal::ZERO));

        Self {
            total_amount,
            paid_amount,
            pending_amount,
            payment_status: StatusDeriver::derive(paid_amount, total_amount),
        }
    }

    /// Largest amount a new payment may carry.
    #[must_use]
    pub fn max_payable(&self) -> Decimal {
        round_money(self.pending_amount)
    }

    /// Returns true if paid and pending still add up to the total.
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        within_tolerance(self.paid_amount + self.pending_amount, self.total_amount)
    }
}
