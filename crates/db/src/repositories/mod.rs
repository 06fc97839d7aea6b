//! Repository layer for ledger access.

pub mod bill;
pub mod error;
pub mod invoice;
pub mod payment;
pub mod summary;
pub mod trip;

pub use bill::BillRepository;
pub use error::LedgerError;
pub use invoice::{Invoice, InvoiceRepository};
pub use payment::{PaymentEntry, PaymentReceipt, PaymentRepository, RecordPaymentInput};
pub use summary::SummaryRepository;
pub use trip::{CreateTripInput, TripRepository};
