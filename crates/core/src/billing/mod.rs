//! Trip → invoice → bill → payment reconciliation.
//!
//! This module implements the pure billing rules:
//! - Invoice assembly from un-invoiced trips (frozen totals)
//! - Bill generation with default due dates
//! - Payment application with overpayment protection
//! - Payment status derivation and overdue detection
//! - Error taxonomy shared by the store and the API

pub mod bill;
pub mod error;
pub mod invoice;
pub mod payment;
pub mod status;
pub mod types;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod invoice_props;

pub use bill::{BillDraft, BillGenerator};
pub use error::{BillingError, ErrorKind, SelectionIssue};
pub use invoice::{InvoiceBuilder, InvoiceDraft};
pub use payment::{PaymentApplication, PaymentRecorder};
pub use status::{Overdue, StatusDeriver, StatusOverride};
pub use types::{Balance, EntryKind, PaymentMode, PaymentStatus, TargetType, TripSnapshot};
