//! Trip aggregation and invoice assembly.
//!
//! The builder validates a caller's trip selection against the trips actually
//! stored and freezes the invoice total. Claiming the trips is the store's job;
//! the builder only decides whether the claim is allowed.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use fleetbill_shared::types::{ClientId, TripId, round_money};
use rust_decimal::Decimal;

use super::error::{BillingError, SelectionIssue};
use super::types::TripSnapshot;

/// A validated invoice ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    /// Client being invoiced.
    pub client_id: ClientId,
    /// Date bucket the trips were performed on.
    pub invoice_date: NaiveDate,
    /// Trips claimed by this invoice, in request order.
    pub trip_ids: Vec<TripId>,
    /// Sum of the trip amounts, rounded half-up to cents.
    pub total_amount: Decimal,
}

/// Builds invoices from un-invoiced trips.
pub struct InvoiceBuilder;

impl InvoiceBuilder {
    /// Sums trip amounts and rounds the result half-up to cents.
    #[must_use]
    pub fn total<'a>(trips: impl IntoIterator<Item = &'a TripSnapshot>) -> Decimal {
        round_money(trips.into_iter().map(|t| t.total_amount).sum())
    }

    /// Validates a trip selection and produces the invoice to persist.
    ///
    /// `stored` holds whatever the store returned for `requested`; ids it does
    /// not contain are reported as missing.
    ///
    /// # Errors
    ///
    /// - `BillingError::EmptySelection` if nothing was requested
    /// - `BillingError::InvalidSelection` listing every trip that is missing,
    ///   duplicated, owned by another client, dated differently, or already
    ///   invoiced
    pub fn build(
        client_id: ClientId,
        invoice_date: NaiveDate,
        requested: &[TripId],
        stored: &[TripSnapshot],
    ) -> Result<InvoiceDraft, BillingError> {
        if requested.is_empty() {
            return Err(BillingError::EmptySelection);
        }

        let by_id: HashMap<TripId, &TripSnapshot> = stored.iter().map(|t| (t.id, t)).collect();
        let mut seen = HashSet::with_capacity(requested.len());
        let mut rejected = Vec::new();
        let mut selected = Vec::with_capacity(requested.len());

        for trip_id in requested {
            if !seen.insert(*trip_id) {
                rejected.push((*trip_id, SelectionIssue::Duplicate));
                continue;
            }

            let Some(trip) = by_id.get(trip_id) else {
                rejected.push((*trip_id, SelectionIssue::NotFound));
                continue;
            };

            if let Some(issue) = Self::check_trip(trip, client_id, invoice_date) {
                rejected.push((*trip_id, issue));
            } else {
                selected.push(*trip);
            }
        }

        if !rejected.is_empty() {
            return Err(BillingError::InvalidSelection { rejected });
        }

        Ok(InvoiceDraft {
            client_id,
            invoice_date,
            trip_ids: selected.iter().map(|t| t.id).collect(),
            total_amount: Self::total(selected.iter().copied()),
        })
    }

    fn check_trip(
        trip: &TripSnapshot,
        client_id: ClientId,
        invoice_date: NaiveDate,
    ) -> Option<SelectionIssue> {
        if trip.client_id != client_id {
            Some(SelectionIssue::WrongClient)
        } else if trip.trip_date != invoice_date {
            Some(SelectionIssue::WrongDate)
        } else if trip.is_invoiced() {
            Some(SelectionIssue::AlreadyInvoiced)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetbill_shared::types::InvoiceId;
    use rust_decimal_macros::dec;

    fn jan_10() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn trip(client_id: ClientId, date: NaiveDate, amount: Decimal) -> TripSnapshot {
        TripSnapshot {
            id: TripId::new(),
            client_id,
            trip_date: date,
            total_amount: amount,
            invoice_id: None,
        }
    }

    #[test]
    fn test_build_sums_selected_trips() {
        let client = ClientId::new();
        let a = trip(client, jan_10(), dec!(5000));
        let b = trip(client, jan_10(), dec!(3000));

        let draft =
            InvoiceBuilder::build(client, jan_10(), &[a.id, b.id], &[a.clone(), b.clone()])
                .unwrap();

        assert_eq!(draft.total_amount, dec!(8000.00));
        assert_eq!(draft.trip_ids, vec![a.id, b.id]);
        assert_eq!(draft.client_id, client);
    }

    #[test]
    fn test_build_rounds_total_half_up() {
        let client = ClientId::new();
        let a = trip(client, jan_10(), dec!(100.125));
        let b = trip(client, jan_10(), dec!(0.0));

        let draft = InvoiceBuilder::build(client, jan_10(), &[a.id, b.id], &[a, b]).unwrap();
        assert_eq!(draft.total_amount, dec!(100.13));
    }

    #[test]
    fn test_build_rejects_empty_selection() {
        assert!(matches!(
            InvoiceBuilder::build(ClientId::new(), jan_10(), &[], &[]),
            Err(BillingError::EmptySelection)
        ));
    }

    #[test]
    fn test_build_reports_every_offender() {
        let client = ClientId::new();
        let ok = trip(client, jan_10(), dec!(10));
        let other_client = trip(ClientId::new(), jan_10(), dec!(10));
        let other_day = trip(client, NaiveDate::from_ymd_opt(2025, 1, 11).unwrap(), dec!(10));
        let mut consumed = trip(client, jan_10(), dec!(10));
        consumed.invoice_id = Some(InvoiceId::new());
        let missing = TripId::new();

        let stored = vec![ok.clone(), other_client.clone(), other_day.clone(), consumed.clone()];
        let requested = [ok.id, other_client.id, other_day.id, consumed.id, missing, ok.id];

        let Err(BillingError::InvalidSelection { rejected }) =
            InvoiceBuilder::build(client, jan_10(), &requested, &stored)
        else {
            panic!("expected InvalidSelection");
        };

        assert_eq!(
            rejected,
            vec![
                (other_client.id, SelectionIssue::WrongClient),
                (other_day.id, SelectionIssue::WrongDate),
                (consumed.id, SelectionIssue::AlreadyInvoiced),
                (missing, SelectionIssue::NotFound),
                (ok.id, SelectionIssue::Duplicate),
            ]
        );
    }
}
