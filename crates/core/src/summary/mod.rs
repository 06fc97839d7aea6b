//! Collection reporting over bills.
//!
//! This module provides pure business logic for:
//! - Filtering bills by client, bill date, status, payment mode, and overdue state
//! - Aggregating billed, received, and pending totals with a collection rate
//! - Deriving overdue flags for individual bill views
//!
//! Totals are recomputed from the bill snapshots on every call.

pub mod service;
pub mod types;


pub use service::SummaryService;
pub use types::*;
