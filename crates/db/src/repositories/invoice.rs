//! Invoice repository.
//!
//! Creating an invoice is the one place trips change hands: the selected trip
//! rows are locked, validated, and claimed in a single transaction, and the
//! claim is re-checked by row count so a concurrent claimer can never win the
//! same trip.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use fleetbill_core::billing::{BillingError, InvoiceBuilder};
use fleetbill_shared::BillingConfig;
use fleetbill_shared::types::{ClientId, InvoiceId, TripId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{LedgerError, set_lock_timeout};
use super::trip::trip_snapshot;
use crate::entities::{invoices, trips};

/// An invoice with the trips it consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Client invoiced.
    pub client_id: ClientId,
    /// Trip date bucket.
    pub date: NaiveDate,
    /// Trips consumed by the invoice.
    pub trip_ids: Vec<TripId>,
    /// Frozen total.
    pub total_amount: Decimal,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl Invoice {
    fn from_model(model: invoices::Model, trip_ids: Vec<TripId>) -> Self {
        Self {
            id: InvoiceId::from_uuid(model.id),
            client_id: ClientId::from_uuid(model.client_id),
            date: model.invoice_date,
            trip_ids,
            total_amount: model.total_amount,
            created_at: model.created_at,
        }
    }
}

/// Repository for invoice operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    config: BillingConfig,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, config: BillingConfig) -> Self {
        Self { db, config }
    }

    /// Claims the selected trips and creates an invoice over them.
    ///
    /// Either every trip is claimed and the invoice exists, or nothing changes.
    ///
    /// # Errors
    ///
    /// - `EmptySelection` / `InvalidSelection` from validation
    /// - `ConcurrentUpdate` if a lock wait timed out or another request
    ///   claimed one of the trips first
    pub async fn create_invoice(
        &self,
        client_id: ClientId,
        invoice_date: NaiveDate,
        trip_ids: &[TripId],
    ) -> Result<Invoice, LedgerError> {
        if trip_ids.is_empty() {
            return Err(BillingError::EmptySelection.into());
        }

        let txn = self.db.begin().await?;
        set_lock_timeout(&txn, self.config.lock_timeout_ms).await?;

        // Lock in id order so overlapping selections cannot deadlock
        let requested: Vec<Uuid> = trip_ids.iter().map(|id| id.into_inner()).collect();
        let stored = trips::Entity::find()
            .filter(trips::Column::Id.is_in(requested))
            .order_by_asc(trips::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await?;

        let snapshots: Vec<_> = stored.iter().map(trip_snapshot).collect();
        let draft = InvoiceBuilder::build(client_id, invoice_date, trip_ids, &snapshots)?;

        let invoice_id = InvoiceId::new();
        let trip_count = i32::try_from(draft.trip_ids.len())
            .map_err(|_| BillingError::Internal("too many trips in one invoice".to_string()))?;

        let invoice = invoices::ActiveModel {
            id: Set(invoice_id.into_inner()),
            client_id: Set(client_id.into_inner()),
            invoice_date: Set(invoice_date),
            trip_count: Set(trip_count),
            total_amount: Set(draft.total_amount),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        let claimed: Vec<Uuid> = draft.trip_ids.iter().map(|id| id.into_inner()).collect();
        let result = trips::Entity::update_many()
            .col_expr(trips::Column::InvoiceId, Expr::value(invoice_id.into_inner()))
            .filter(trips::Column::Id.is_in(claimed))
            .filter(trips::Column::InvoiceId.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected != draft.trip_ids.len() as u64 {
            warn!(
                client_id = %client_id,
                requested = draft.trip_ids.len(),
                claimed = result.rows_affected,
                "Trip claim lost a race, rolling back invoice"
            );
            return Err(BillingError::ConcurrentUpdate.into());
        }

        txn.commit().await?;

        info!(
            invoice_id = %invoice_id,
            client_id = %client_id,
            date = %invoice_date,
            trips = draft.trip_ids.len(),
            total = %draft.total_amount,
            "Invoice created"
        );

        Ok(Invoice::from_model(invoice, draft.trip_ids))
    }

    /// Fetches an invoice with its trip IDs.
    pub async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, LedgerError> {
        let invoice = invoices::Entity::find_by_id(invoice_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

        let trip_ids = trips::Entity::find()
            .select_only()
            .column(trips::Column::Id)
            .filter(trips::Column::InvoiceId.eq(invoice_id.into_inner()))
            .order_by_asc(trips::Column::Id)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(TripId::from_uuid)
            .collect();

        Ok(Invoice::from_model(invoice, trip_ids))
    }
}
