//! `SeaORM` entities for the ledger tables.

pub mod prelude;

pub mod bills;
pub mod invoices;
pub mod payment_entries;
pub mod sea_orm_active_enums;
pub mod trips;
