//! Trip repository: unbilled trip lookup and trip-level balances.

use chrono::{NaiveDate, Utc};
use fleetbill_core::billing::{Balance, BillingError, TripSnapshot};
use fleetbill_shared::types::{ClientId, InvoiceId, TripId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::error::LedgerError;
use crate::entities::trips;

/// Input for registering a trip.
///
/// Trips are normally entered by an external system; this exists for imports
/// and test fixtures.
#[derive(Debug, Clone)]
pub struct CreateTripInput {
    /// Client the trip was performed for.
    pub client_id: ClientId,
    /// Date of the trip.
    pub trip_date: NaiveDate,
    /// Billable amount.
    pub total_amount: Decimal,
    /// Pickup location.
    pub origin: Option<String>,
    /// Drop location.
    pub destination: Option<String>,
    /// Vehicle registration.
    pub vehicle_no: Option<String>,
}

/// Converts a stored trip into the snapshot the invoice builder validates.
#[must_use]
pub fn trip_snapshot(model: &trips::Model) -> TripSnapshot {
    TripSnapshot {
        id: TripId::from_uuid(model.id),
        client_id: ClientId::from_uuid(model.client_id),
        trip_date: model.trip_date,
        total_amount: model.total_amount,
        invoice_id: model.invoice_id.map(InvoiceId::from_uuid),
    }
}

/// Trip-level balance derived from a stored trip.
#[must_use]
pub fn trip_balance(model: &trips::Model) -> Balance {
    Balance::from_paid(model.total_amount, model.paid_amount)
}

/// Repository for trip reads.
#[derive(Debug, Clone)]
pub struct TripRepository {
    db: DatabaseConnection,
}

impl TripRepository {
    /// Creates a new trip repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a trip.
    pub async fn create_trip(&self, input: CreateTripInput) -> Result<trips::Model, LedgerError> {
        let now = Utc::now().into();

        let trip = trips::ActiveModel {
            id: Set(TripId::new().into_inner()),
            client_id: Set(input.client_id.into_inner()),
            trip_date: Set(input.trip_date),
            origin: Set(input.origin),
            destination: Set(input.destination),
            vehicle_no: Set(input.vehicle_no),
            total_amount: Set(fleetbill_shared::types::round_money(input.total_amount)),
            paid_amount: Set(Decimal::ZERO),
            invoice_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(trip.insert(&self.db).await?)
    }

    /// Distinct dates, ascending, on which the client has un-invoiced trips.
    pub async fn list_unbilled_dates(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<NaiveDate>, LedgerError> {
        let dates = trips::Entity::find()
            .select_only()
            .column(trips::Column::TripDate)
            .distinct()
            .filter(trips::Column::ClientId.eq(client_id.into_inner()))
            .filter(trips::Column::InvoiceId.is_null())
            .order_by_asc(trips::Column::TripDate)
            .into_tuple::<NaiveDate>()
            .all(&self.db)
            .await?;

        Ok(dates)
    }

    /// Un-invoiced trips for a client on a date. Empty when none match.
    pub async fn list_unbilled_trips(
        &self,
        client_id: ClientId,
        trip_date: NaiveDate,
    ) -> Result<Vec<trips::Model>, LedgerError> {
        let trips = trips::Entity::find()
            .filter(trips::Column::ClientId.eq(client_id.into_inner()))
            .filter(trips::Column::TripDate.eq(trip_date))
            .filter(trips::Column::InvoiceId.is_null())
            .order_by_asc(trips::Column::CreatedAt)
            .order_by_asc(trips::Column::Id)
            .all(&self.db)
            .await?;

        Ok(trips)
    }

    /// Finds a trip by ID.
    pub async fn find_by_id(&self, trip_id: TripId) -> Result<Option<trips::Model>, LedgerError> {
        Ok(trips::Entity::find_by_id(Uuid::from(trip_id))
            .one(&self.db)
            .await?)
    }

    /// Current trip-level balance.
    pub async fn get_balance(&self, trip_id: TripId) -> Result<Balance, LedgerError> {
        let trip = self
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| BillingError::trip_not_found(trip_id))?;

        Ok(trip_balance(&trip))
    }
}
