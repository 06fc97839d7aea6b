//! Entity re-exports.

pub use super::bills::Entity as Bills;
pub use super::invoices::Entity as Invoices;
pub use super::payment_entries::Entity as PaymentEntries;
pub use super::trips::Entity as Trips;
