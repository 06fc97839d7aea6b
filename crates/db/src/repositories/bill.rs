//! Bill repository: generation, lookup, manual status override, and deletion.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, Utc};
use fleetbill_core::billing::{
    Balance, BillGenerator, BillingError, EntryKind, PaymentMode, PaymentStatus, StatusDeriver,
    StatusOverride, TargetType,
};
use fleetbill_core::summary::{BillSnapshot, SummaryFilter};
use fleetbill_shared::BillingConfig;
use fleetbill_shared::types::{BillId, ClientId, InvoiceId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::error::{LedgerError, set_lock_timeout};
use super::payment::{LockedTarget, RecordPaymentInput, insert_entry};
use crate::entities::{bills, invoices, payment_entries, sea_orm_active_enums, trips};

/// Builds a snapshot from a stored bill and the modes it was paid in.
#[must_use]
pub fn bill_snapshot(model: &bills::Model, payment_modes: BTreeSet<PaymentMode>) -> BillSnapshot {
    BillSnapshot {
        id: BillId::from_uuid(model.id),
        invoice_id: InvoiceId::from_uuid(model.invoice_id),
        client_id: ClientId::from_uuid(model.client_id),
        bill_date: model.bill_date,
        due_date: model.due_date,
        balance: Balance::from_paid(model.total_amount, model.paid_amount),
        payment_modes,
    }
}

/// Loads bills matching the SQL-expressible parts of `filter`, with their
/// payment modes. Overdue and mode filtering is left to the caller.
pub(crate) async fn load_snapshots<C: ConnectionTrait>(
    db: &C,
    filter: &SummaryFilter,
    today: NaiveDate,
) -> Result<Vec<BillSnapshot>, LedgerError> {
    let mut query = bills::Entity::find();

    if let Some(client_id) = filter.client_id {
        query = query.filter(bills::Column::ClientId.eq(client_id.into_inner()));
    }
    if let Some(range) = filter.date_range {
        if let Some(from) = range.from {
            query = query.filter(bills::Column::BillDate.gte(from));
        }
        if let Some(to) = range.to {
            query = query.filter(bills::Column::BillDate.lte(to));
        }
    }
    if let Some(status) = filter.status {
        let status: sea_orm_active_enums::PaymentStatus = status.into();
        query = query.filter(bills::Column::PaymentStatus.eq(status));
    }
    if filter.overdue_only {
        query = query
            .filter(bills::Column::PaymentStatus.ne(sea_orm_active_enums::PaymentStatus::Paid))
            .filter(bills::Column::DueDate.lt(today));
    }

    let bills = query
        .order_by_desc(bills::Column::BillDate)
        .order_by_desc(bills::Column::Id)
        .all(db)
        .await?;

    let modes = load_payment_modes(db, bills.iter().map(|b| (b.id, b.invoice_id)).collect()).await?;

    Ok(bills
        .iter()
        .map(|bill| bill_snapshot(bill, modes.get(&bill.id).cloned().unwrap_or_default()))
        .collect())
}

/// Distinct payment modes per bill, keyed by bill ID.
///
/// Takes `(bill_id, invoice_id)` pairs. Entries against the bill and against
/// the trips of its invoice both count.
async fn load_payment_modes<C: ConnectionTrait>(
    db: &C,
    bills: Vec<(Uuid, Uuid)>,
) -> Result<HashMap<Uuid, BTreeSet<PaymentMode>>, LedgerError> {
    let mut modes: HashMap<Uuid, BTreeSet<PaymentMode>> = HashMap::new();
    if bills.is_empty() {
        return Ok(modes);
    }

    let bill_by_invoice: HashMap<Uuid, Uuid> =
        bills.iter().map(|(bill, invoice)| (*invoice, *bill)).collect();

    let trip_rows = trips::Entity::find()
        .select_only()
        .column(trips::Column::Id)
        .column(trips::Column::InvoiceId)
        .filter(trips::Column::InvoiceId.is_in(bill_by_invoice.keys().copied()))
        .into_tuple::<(Uuid, Uuid)>()
        .all(db)
        .await?;
    let bill_by_trip: HashMap<Uuid, Uuid> = trip_rows
        .into_iter()
        .filter_map(|(trip, invoice)| bill_by_invoice.get(&invoice).map(|bill| (trip, *bill)))
        .collect();

    let bill_ids = bills.iter().map(|(bill, _)| *bill);
    let targets = Condition::any()
        .add(
            payment_entries::Column::TargetType
                .eq(sea_orm_active_enums::TargetType::Bill)
                .and(payment_entries::Column::TargetId.is_in(bill_ids)),
        )
        .add(
            payment_entries::Column::TargetType
                .eq(sea_orm_active_enums::TargetType::Trip)
                .and(payment_entries::Column::TargetId.is_in(bill_by_trip.keys().copied())),
        );

    let rows = payment_entries::Entity::find()
        .select_only()
        .column(payment_entries::Column::TargetType)
        .column(payment_entries::Column::TargetId)
        .column(payment_entries::Column::PaymentMode)
        .distinct()
        .filter(targets)
        .into_tuple::<(
            sea_orm_active_enums::TargetType,
            Uuid,
            sea_orm_active_enums::PaymentMode,
        )>()
        .all(db)
        .await?;

    for (target_type, target_id, mode) in rows {
        let bill_id = match target_type {
            sea_orm_active_enums::TargetType::Bill => Some(target_id),
            sea_orm_active_enums::TargetType::Trip => bill_by_trip.get(&target_id).copied(),
        };
        if let Some(bill_id) = bill_id {
            modes.entry(bill_id).or_default().insert(mode.into());
        }
    }
    Ok(modes)
}

/// Repository for bill operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    db: DatabaseConnection,
    config: BillingConfig,
}

impl BillRepository {
    /// Creates a new bill repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, config: BillingConfig) -> Self {
        Self { db, config }
    }

    /// Creates the bill for an invoice.
    ///
    /// `due_date` defaults to `bill_date + default_grace_days`.
    /// Amounts already paid against the invoice's trips count toward the new
    /// bill, so it may open as `PARTIAL` or `PAID`.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the invoice does not exist
    /// - `BillAlreadyExists` if the invoice already has a bill
    /// - `InvalidDueDate` if the due date precedes the bill date
    /// - `ConcurrentUpdate` if the invoice or its trips stayed locked past the timeout
    pub async fn create_bill(
        &self,
        invoice_id: InvoiceId,
        bill_date: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> Result<BillSnapshot, LedgerError> {
        let txn = self.db.begin().await?;
        set_lock_timeout(&txn, self.config.lock_timeout_ms).await?;

        let invoice = invoices::Entity::find_by_id(invoice_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

        // Trip before bill, same order as trip payments
        let invoiced_trips = trips::Entity::find()
            .filter(trips::Column::InvoiceId.eq(invoice.id))
            .order_by_asc(trips::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await?;
        let prepaid: Decimal = invoiced_trips.iter().map(|t| t.paid_amount).sum();

        let existing = bills::Entity::find()
            .filter(bills::Column::InvoiceId.eq(invoice.id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(BillingError::BillAlreadyExists(invoice_id).into());
        }

        let draft = BillGenerator::generate(
            invoice_id,
            invoice.total_amount,
            bill_date,
            due_date,
            self.config.default_grace_days,
        )?;
        let opening = Balance::from_paid(draft.balance.total_amount, prepaid);

        let now = Utc::now().into();
        let bill = bills::ActiveModel {
            id: Set(BillId::new().into_inner()),
            invoice_id: Set(invoice.id),
            client_id: Set(invoice.client_id),
            bill_date: Set(draft.bill_date),
            due_date: Set(draft.due_date),
            total_amount: Set(opening.total_amount),
            paid_amount: Set(opening.paid_amount),
            pending_amount: Set(opening.pending_amount),
            payment_status: Set(opening.payment_status.into()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(LedgerError::from)
        .map_err(|e| {
            // Lost the race to a concurrent create for the same invoice
            if e.is_unique_violation() {
                BillingError::BillAlreadyExists(invoice_id).into()
            } else {
                e
            }
        })?;

        txn.commit().await?;

        info!(
            bill_id = %bill.id,
            invoice_id = %invoice_id,
            total = %bill.total_amount,
            prepaid = %bill.paid_amount,
            due_date = %bill.due_date,
            "Bill created"
        );

        let mut modes = load_payment_modes(&self.db, vec![(bill.id, bill.invoice_id)]).await?;
        Ok(bill_snapshot(&bill, modes.remove(&bill.id).unwrap_or_default()))
    }

    /// Fetches a bill.
    pub async fn get_bill(&self, bill_id: BillId) -> Result<BillSnapshot, LedgerError> {
        load_one(&self.db, bill_id).await
    }

    /// Bills matching a filter, newest bill date first.
    ///
    /// The full filter is applied, including the overdue and payment-mode parts.
    pub async fn list_bills(
        &self,
        filter: &SummaryFilter,
        today: NaiveDate,
    ) -> Result<Vec<BillSnapshot>, LedgerError> {
        let snapshots = load_snapshots(&self.db, filter, today).await?;
        Ok(snapshots
            .into_iter()
            .filter(|b| filter.matches(b, today))
            .collect())
    }

    /// Applies a manual status override.
    ///
    /// Requesting the current status changes nothing. Requesting `PAID`
    /// settles the pending amount with an `ADJUSTMENT` entry, so the amounts
    /// and the status stay consistent.
    ///
    /// # Errors
    ///
    /// - `TargetNotFound` if the bill does not exist
    /// - `InvalidStatus` if the status cannot be reached from the current amounts
    pub async fn update_status(
        &self,
        bill_id: BillId,
        requested: PaymentStatus,
        remarks: Option<String>,
    ) -> Result<BillSnapshot, LedgerError> {
        let txn = self.db.begin().await?;
        set_lock_timeout(&txn, self.config.lock_timeout_ms).await?;

        let target = LockedTarget::lock(&txn, TargetType::Bill, bill_id.into_inner()).await?;
        let current = target.balance();

        match StatusDeriver::plan_override(&current, requested)? {
            StatusOverride::Unchanged => {}
            StatusOverride::Settle { amount } => {
                let input = RecordPaymentInput {
                    target_type: TargetType::Bill,
                    target_id: bill_id.into_inner(),
                    amount,
                    mode: PaymentMode::Adjustment,
                    reference_no: None,
                    remarks: remarks.or_else(|| Some("Manual status override".to_string())),
                };
                insert_entry(&txn, &input, amount, EntryKind::Full).await?;
                let settled = Balance::from_paid(current.total_amount, current.total_amount);
                target.store(&txn, &settled, None).await?;

                info!(
                    bill_id = %bill_id,
                    settled = %amount,
                    "Bill marked paid by manual override"
                );
            }
        }

        let snapshot = load_one(&txn, bill_id).await?;
        txn.commit().await?;
        Ok(snapshot)
    }

    /// Hard-deletes a bill and its payment entries.
    ///
    /// The invoice and its trips are left untouched; the trips stay invoiced.
    ///
    /// # Errors
    ///
    /// Returns `TargetNotFound` if the bill does not exist.
    pub async fn delete_bill(&self, bill_id: BillId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await?;
        set_lock_timeout(&txn, self.config.lock_timeout_ms).await?;

        LockedTarget::lock(&txn, TargetType::Bill, bill_id.into_inner()).await?;

        let entries = payment_entries::Entity::delete_many()
            .filter(payment_entries::Column::TargetType.eq(sea_orm_active_enums::TargetType::Bill))
            .filter(payment_entries::Column::TargetId.eq(bill_id.into_inner()))
            .exec(&txn)
            .await?;

        let result = bills::Entity::delete_by_id(bill_id.into_inner())
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(BillingError::bill_not_found(bill_id).into());
        }

        txn.commit().await?;

        info!(
            bill_id = %bill_id,
            entries_removed = entries.rows_affected,
            "Bill deleted"
        );
        Ok(())
    }
}

/// Loads one bill with its payment modes.
async fn load_one<C: ConnectionTrait>(db: &C, bill_id: BillId) -> Result<BillSnapshot, LedgerError> {
    let bill = bills::Entity::find_by_id(bill_id.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| BillingError::bill_not_found(bill_id))?;
    let mut modes = load_payment_modes(db, vec![(bill.id, bill.invoice_id)]).await?;
    Ok(bill_snapshot(&bill, modes.remove(&bill.id).unwrap_or_default()))
}
