//! Property-based tests for trip aggregation.
//!
//! - No double invoicing: once a trip is claimed, no later selection can claim it
//! - Re-aggregation: only unclaimed trips are offered after a claim
//! - Totals: the invoice total is the rounded sum of its trips

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::{BillingError, SelectionIssue};
use super::invoice::InvoiceBuilder;
use super::types::TripSnapshot;
use fleetbill_shared::types::{ClientId, InvoiceId, TripId, round_money};

fn trip_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
}

/// Strategy to generate trip amounts with up to 4 decimal places.
fn trip_amount() -> impl Strategy<Value = Decimal> {
    (0i64..50_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

fn trips_for(client_id: ClientId, amounts: &[Decimal]) -> Vec<TripSnapshot> {
    amounts
        .iter()
        .map(|amount| TripSnapshot {
            id: TripId::new(),
            client_id,
            trip_date: trip_date(),
            total_amount: *amount,
            invoice_id: None,
        })
        .collect()
}

/// Distinct dates that still have an un-invoiced trip.
fn unbilled_dates(trips: &[TripSnapshot]) -> BTreeSet<NaiveDate> {
    trips.iter().filter(|t| !t.is_invoiced()).map(|t| t.trip_date).collect()
}

/// Marks the drafted trips as consumed, the way the store claims them.
fn claim(trips: &mut [TripSnapshot], claimed: &[TripId]) {
    let invoice_id = InvoiceId::new();
    for trip in trips.iter_mut().filter(|t| claimed.contains(&t.id)) {
        trip.invoice_id = Some(invoice_id);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Invoice total equals the rounded sum of the selected trip amounts.
    #[test]
    fn prop_total_is_rounded_sum(amounts in prop::collection::vec(trip_amount(), 1..30)) {
        let client = ClientId::new();
        let trips = trips_for(client, &amounts);
        let ids: Vec<TripId> = trips.iter().map(|t| t.id).collect();

        let draft = InvoiceBuilder::build(client, trip_date(), &ids, &trips).unwrap();

        let expected = round_money(amounts.iter().copied().sum());
        prop_assert_eq!(draft.total_amount, expected);
        prop_assert_eq!(draft.total_amount.scale(), 2);
    }

    /// A claimed trip is rejected by every later selection that includes it.
    #[test]
    fn prop_no_double_invoicing(
        amounts in prop::collection::vec(trip_amount(), 2..20),
        split in 1usize..19,
    ) {
        let split = split.min(amounts.len() - 1);
        let client = ClientId::new();
        let mut trips = trips_for(client, &amounts);
        let ids: Vec<TripId> = trips.iter().map(|t| t.id).collect();

        let first = InvoiceBuilder::build(client, trip_date(), &ids[..split], &trips).unwrap();
        claim(&mut trips, &first.trip_ids);

        let overlap = &ids[split - 1..];
        let result = InvoiceBuilder::build(client, trip_date(), overlap, &trips);

        let Err(BillingError::InvalidSelection { rejected }) = result else {
            return Err(TestCaseError::fail("overlapping selection was accepted"));
        };
        prop_assert_eq!(rejected, vec![(ids[split - 1], SelectionIssue::AlreadyInvoiced)]);
    }

    /// After a claim, the remaining trips can be invoiced exactly once and the
    /// two invoices partition the original set.
    #[test]
    fn prop_reaggregation_partitions_trips(
        amounts in prop::collection::vec(trip_amount(), 2..20),
        split in 1usize..19,
    ) {
        let split = split.min(amounts.len() - 1);
        let client = ClientId::new();
        let mut trips = trips_for(client, &amounts);
        let ids: Vec<TripId> = trips.iter().map(|t| t.id).collect();

        let first = InvoiceBuilder::build(client, trip_date(), &ids[..split], &trips).unwrap();
        claim(&mut trips, &first.trip_ids);

        let unbilled: Vec<TripId> = trips.iter().filter(|t| !t.is_invoiced()).map(|t| t.id).collect();
        prop_assert_eq!(&unbilled[..], &ids[split..]);
        prop_assert_eq!(
            unbilled_dates(&trips).into_iter().collect::<Vec<_>>(),
            vec![trip_date()]
        );

        let second = InvoiceBuilder::build(client, trip_date(), &unbilled, &trips).unwrap();
        claim(&mut trips, &second.trip_ids);

        let first_set: HashSet<TripId> = first.trip_ids.iter().copied().collect();
        let second_set: HashSet<TripId> = second.trip_ids.iter().copied().collect();
        prop_assert!(first_set.is_disjoint(&second_set));
        prop_assert_eq!(first_set.len() + second_set.len(), ids.len());
        prop_assert!(unbilled_dates(&trips).is_empty());
    }
}
