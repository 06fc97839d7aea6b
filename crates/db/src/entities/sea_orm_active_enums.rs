//! `SeaORM` active enums mapped to Postgres enum types.

use fleetbill_core::billing;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `payment_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    #[sea_orm(string_value = "PAID")]
    Paid,
}

/// `payment_target` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_target")]
pub enum TargetType {
    #[sea_orm(string_value = "BILL")]
    Bill,
    #[sea_orm(string_value = "TRIP")]
    Trip,
}

/// `payment_mode` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_mode")]
pub enum PaymentMode {
    #[sea_orm(string_value = "CASH")]
    Cash,
    #[sea_orm(string_value = "UPI")]
    Upi,
    #[sea_orm(string_value = "BANK_TRANSFER")]
    BankTransfer,
    #[sea_orm(string_value = "CHEQUE")]
    Cheque,
    #[sea_orm(string_value = "CARD")]
    Card,
    #[sea_orm(string_value = "ADJUSTMENT")]
    Adjustment,
}

/// `entry_kind` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_kind")]
pub enum EntryKind {
    #[sea_orm(string_value = "FULL")]
    Full,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
}

impl From<billing::PaymentStatus> for PaymentStatus {
    fn from(value: billing::PaymentStatus) -> Self {
        match value {
            billing::PaymentStatus::Unpaid => Self::Unpaid,
            billing::PaymentStatus::Partial => Self::Partial,
            billing::PaymentStatus::Paid => Self::Paid,
        }
    }
}

impl From<PaymentStatus> for billing::PaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Unpaid => Self::Unpaid,
            PaymentStatus::Partial => Self::Partial,
            PaymentStatus::Paid => Self::Paid,
        }
    }
}

impl From<billing::TargetType> for TargetType {
    fn from(value: billing::TargetType) -> Self {
        match value {
            billing::TargetType::Bill => Self::Bill,
            billing::TargetType::Trip => Self::Trip,
        }
    }
}

impl From<TargetType> for billing::TargetType {
    fn from(value: TargetType) -> Self {
        match value {
            TargetType::Bill => Self::Bill,
            TargetType::Trip => Self::Trip,
        }
    }
}

impl From<billing::PaymentMode> for PaymentMode {
    fn from(value: billing::PaymentMode) -> Self {
        match value {
            billing::PaymentMode::Cash => Self::Cash,
            billing::PaymentMode::Upi => Self::Upi,
            billing::PaymentMode::BankTransfer => Self::BankTransfer,
            billing::PaymentMode::Cheque => Self::Cheque,
            billing::PaymentMode::Card => Self::Card,
            billing::PaymentMode::Adjustment => Self::Adjustment,
        }
    }
}

impl From<PaymentMode> for billing::PaymentMode {
    fn from(value: PaymentMode) -> Self {
        match value {
            PaymentMode::Cash => Self::Cash,
            PaymentMode::Upi => Self::Upi,
            PaymentMode::BankTransfer => Self::BankTransfer,
            PaymentMode::Cheque => Self::Cheque,
            PaymentMode::Card => Self::Card,
            PaymentMode::Adjustment => Self::Adjustment,
        }
    }
}

impl From<billing::EntryKind> for EntryKind {
    fn from(value: billing::EntryKind) -> Self {
        match value {
            billing::EntryKind::Full => Self::Full,
            billing::EntryKind::Partial => Self::Partial,
        }
    }
}

impl From<EntryKind> for billing::EntryKind {
    fn from(value: EntryKind) -> Self {
        match value {
            EntryKind::Full => Self::Full,
            EntryKind::Partial => Self::Partial,
        }
    }
}
