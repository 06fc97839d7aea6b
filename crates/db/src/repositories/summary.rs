//! Summary repository.
//!
//! Reads bills straight from the ledger on every call; nothing is cached.

use chrono::NaiveDate;
use fleetbill_core::summary::{Summary, SummaryFilter, SummaryService};
use sea_orm::DatabaseConnection;
use tracing::debug;

use super::bill::load_snapshots;
use super::error::LedgerError;

/// Repository for collection summaries.
#[derive(Debug, Clone)]
pub struct SummaryRepository {
    db: DatabaseConnection,
}

impl SummaryRepository {
    /// Creates a new summary repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Computes collection totals for the bills matching `filter` on `today`.
    pub async fn summarize(
        &self,
        filter: &SummaryFilter,
        today: NaiveDate,
    ) -> Result<Summary, LedgerError> {
        let bills = load_snapshots(&self.db, filter, today).await?;
        let summary = SummaryService::summarize(&bills, filter, today);

        debug!(
            candidates = bills.len(),
            matched = summary.count,
            billed = %summary.total_billed,
            "Summary computed"
        );

        Ok(summary)
    }
}
