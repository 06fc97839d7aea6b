//! Payment repository.
//!
//! Every mutation locks its target row (`SELECT ... FOR UPDATE` under a
//! bounded `lock_timeout`), applies the payment rules to the locked balance,
//! appends or removes the entry, and writes the new balance back before
//! committing. Two concurrent payments against the same target are therefore
//! applied one after the other, and the second sees the first's balance.
//!
//! Payments against a billed trip also count toward its bill. Locks are always
//! taken trip first, then bill.

use chrono::{DateTime, FixedOffset, Utc};
use fleetbill_core::billing::{
    Balance, BillingError, EntryKind, PaymentMode, PaymentRecorder, TargetType,
};
use fleetbill_shared::BillingConfig;
use fleetbill_shared::types::PaymentEntryId;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{LedgerError, set_lock_timeout};
use super::trip::trip_balance;
use crate::entities::{bills, payment_entries, sea_orm_active_enums, trips};

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    /// Bill or trip.
    pub target_type: TargetType,
    /// Target record ID.
    pub target_id: Uuid,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment mode.
    pub mode: PaymentMode,
    /// External reference (UTR, cheque number, ...).
    pub reference_no: Option<String>,
    /// Free-form remarks.
    pub remarks: Option<String>,
}

/// A recorded payment entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentEntry {
    /// Entry ID.
    pub id: PaymentEntryId,
    /// Bill or trip.
    pub target_type: TargetType,
    /// Target record ID.
    pub target_id: Uuid,
    /// Amount recorded.
    pub amount: Decimal,
    /// Payment mode.
    pub payment_mode: PaymentMode,
    /// Whether the entry cleared the balance.
    pub entry_kind: EntryKind,
    /// External reference.
    pub reference_no: Option<String>,
    /// Remarks.
    pub remarks: Option<String>,
    /// When the entry was recorded.
    pub recorded_at: DateTime<FixedOffset>,
}

impl From<payment_entries::Model> for PaymentEntry {
    fn from(model: payment_entries::Model) -> Self {
        Self {
            id: PaymentEntryId::from_uuid(model.id),
            target_type: model.target_type.into(),
            target_id: model.target_id,
            amount: model.amount,
            payment_mode: model.payment_mode.into(),
            entry_kind: model.entry_kind.into(),
            reference_no: model.reference_no,
            remarks: model.remarks,
            recorded_at: model.recorded_at,
        }
    }
}

/// Outcome of a recorded payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// The appended entry.
    pub entry: PaymentEntry,
    /// Target balance after the payment.
    pub balance: Balance,
}

/// A bill or trip row locked for the current transaction.
///
/// A trip whose invoice has been billed carries its bill as `cover`: the
/// bill row is locked after the trip row, and every amount paid or reversed
/// on the trip is mirrored on the bill.
pub(crate) enum LockedTarget {
    Bill(bills::Model),
    Trip {
        trip: trips::Model,
        cover: Option<bills::Model>,
    },
}

impl LockedTarget {
    /// Locks the target row, failing with `TargetNotFound` if it is missing.
    pub(crate) async fn lock(
        txn: &DatabaseTransaction,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<Self, LedgerError> {
        match target_type {
            TargetType::Bill => bills::Entity::find_by_id(target_id)
                .lock_exclusive()
                .one(txn)
                .await?
                .map(Self::Bill)
                .ok_or_else(|| BillingError::bill_not_found(target_id).into()),
            TargetType::Trip => {
                let trip = trips::Entity::find_by_id(target_id)
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(|| BillingError::trip_not_found(target_id))?;

                let cover = match trip.invoice_id {
                    Some(invoice_id) => {
                        bills::Entity::find()
                            .filter(bills::Column::InvoiceId.eq(invoice_id))
                            .lock_exclusive()
                            .one(txn)
                            .await?
                    }
                    None => None,
                };

                Ok(Self::Trip { trip, cover })
            }
        }
    }

    pub(crate) fn balance(&self) -> Balance {
        match self {
            Self::Bill(bill) => bill_balance(bill),
            Self::Trip { trip, .. } => trip_balance(trip),
        }
    }

    /// Balance of the bill covering a billed trip.
    pub(crate) fn cover_balance(&self) -> Option<Balance> {
        match self {
            Self::Trip {
                cover: Some(bill), ..
            } => Some(bill_balance(bill)),
            _ => None,
        }
    }

    /// Writes the new balances back to the locked rows.
    ///
    /// `cover` is only written when the target is a billed trip.
    pub(crate) async fn store(
        self,
        txn: &DatabaseTransaction,
        balance: &Balance,
        cover: Option<&Balance>,
    ) -> Result<(), LedgerError> {
        debug_assert!(balance.is_conserved());
        match self {
            Self::Bill(bill) => store_bill(txn, bill, balance).await?,
            Self::Trip { trip, cover: bill } => {
                let mut active: trips::ActiveModel = trip.into();
                active.paid_amount = Set(balance.paid_amount);
                active.update(txn).await?;

                if let (Some(bill), Some(cover)) = (bill, cover) {
                    debug_assert!(cover.is_conserved());
                    store_bill(txn, bill, cover).await?;
                }
            }
        }
        Ok(())
    }
}

fn bill_balance(bill: &bills::Model) -> Balance {
    Balance::from_paid(bill.total_amount, bill.paid_amount)
}

async fn store_bill(
    txn: &DatabaseTransaction,
    bill: bills::Model,
    balance: &Balance,
) -> Result<(), LedgerError> {
    let mut active: bills::ActiveModel = bill.into();
    active.paid_amount = Set(balance.paid_amount);
    active.pending_amount = Set(balance.pending_amount);
    active.payment_status = Set(balance.payment_status.into());
    active.update(txn).await?;
    Ok(())
}

/// Appends a payment entry inside an open transaction.
pub(crate) async fn insert_entry(
    txn: &DatabaseTransaction,
    input: &RecordPaymentInput,
    amount: Decimal,
    entry_kind: EntryKind,
) -> Result<payment_entries::Model, LedgerError> {
    let entry = payment_entries::ActiveModel {
        id: Set(PaymentEntryId::new().into_inner()),
        target_type: Set(input.target_type.into()),
        target_id: Set(input.target_id),
        amount: Set(amount),
        payment_mode: Set(input.mode.into()),
        entry_kind: Set(entry_kind.into()),
        reference_no: Set(input.reference_no.clone()),
        remarks: Set(input.remarks.clone()),
        recorded_at: Set(Utc::now().into()),
    };

    Ok(entry.insert(txn).await?)
}

/// Repository for payment operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
    config: BillingConfig,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, config: BillingConfig) -> Self {
        Self { db, config }
    }

    /// Records a payment against a bill or a trip.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not positive
    /// - `TargetNotFound` if the bill or trip does not exist
    /// - `Overpayment` if the amount exceeds the pending balance
    /// - `ConcurrentUpdate` if the target row stayed locked past the timeout
    pub async fn record_payment(
        &self,
        input: RecordPaymentInput,
    ) -> Result<PaymentReceipt, LedgerError> {
        PaymentRecorder::validate_amount(input.amount)?;

        let txn = self.db.begin().await?;
        set_lock_timeout(&txn, self.config.lock_timeout_ms).await?;

        let target = LockedTarget::lock(&txn, input.target_type, input.target_id).await?;
        let current = target.balance();
        let cover = target.cover_balance();

        let (applied, cover_after) =
            match PaymentRecorder::apply_covered(&current, cover.as_ref(), input.amount) {
                Ok(applied) => applied,
                Err(e) => {
                    warn!(
                        target_type = %input.target_type,
                        target_id = %input.target_id,
                        attempted = %input.amount,
                        pending = %current.pending_amount,
                        bill_pending = ?cover.map(|c| c.pending_amount),
                        "Payment rejected"
                    );
                    return Err(e.into());
                }
            };

        let entry = insert_entry(&txn, &input, applied.amount, applied.entry_kind).await?;
        target
            .store(&txn, &applied.balance, cover_after.as_ref())
            .await?;

        txn.commit().await?;

        info!(
            entry_id = %entry.id,
            target_type = %input.target_type,
            target_id = %input.target_id,
            amount = %applied.amount,
            mode = %input.mode,
            paid = %applied.balance.paid_amount,
            pending = %applied.balance.pending_amount,
            status = %applied.balance.payment_status,
            "Payment recorded"
        );

        Ok(PaymentReceipt {
            entry: entry.into(),
            balance: applied.balance,
        })
    }

    /// Payment history for a target, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TargetNotFound` if the bill or trip does not exist.
    pub async fn list_entries(
        &self,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<Vec<PaymentEntry>, LedgerError> {
        let exists = match target_type {
            TargetType::Bill => bills::Entity::find_by_id(target_id)
                .one(&self.db)
                .await?
                .is_some(),
            TargetType::Trip => trips::Entity::find_by_id(target_id)
                .one(&self.db)
                .await?
                .is_some(),
        };
        if !exists {
            return Err(BillingError::TargetNotFound {
                target_type,
                id: target_id,
            }
            .into());
        }

        let target: sea_orm_active_enums::TargetType = target_type.into();
        let entries = payment_entries::Entity::find()
            .filter(payment_entries::Column::TargetType.eq(target))
            .filter(payment_entries::Column::TargetId.eq(target_id))
            .order_by_desc(payment_entries::Column::RecordedAt)
            .order_by_desc(payment_entries::Column::Id)
            .all(&self.db)
            .await?;

        Ok(entries.into_iter().map(PaymentEntry::from).collect())
    }

    /// Deletes a payment entry and reverses its amount on the target balance.
    ///
    /// # Errors
    ///
    /// - `PaymentEntryNotFound` if the entry does not exist
    /// - `ConcurrentUpdate` if the target row stayed locked past the timeout
    pub async fn delete_entry(&self, entry_id: PaymentEntryId) -> Result<Balance, LedgerError> {
        let txn = self.db.begin().await?;
        set_lock_timeout(&txn, self.config.lock_timeout_ms).await?;

        let entry = payment_entries::Entity::find_by_id(entry_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(BillingError::PaymentEntryNotFound(entry_id))?;

        let target = LockedTarget::lock(&txn, entry.target_type.into(), entry.target_id).await?;
        let reversed = PaymentRecorder::reverse(&target.balance(), entry.amount);
        let cover = target
            .cover_balance()
            .map(|c| PaymentRecorder::reverse(&c, entry.amount));
        let amount = entry.amount;

        entry.delete(&txn).await?;
        target.store(&txn, &reversed, cover.as_ref()).await?;

        txn.commit().await?;

        info!(
            entry_id = %entry_id,
            amount = %amount,
            pending = %reversed.pending_amount,
            status = %reversed.payment_status,
            "Payment entry deleted"
        );

        Ok(reversed)
    }
}
