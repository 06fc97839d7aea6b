//! Error type shared by the ledger repositories.

use fleetbill_core::billing::BillingError;
use sea_orm::{ConnectionTrait, DatabaseTransaction, DbErr, RuntimeErr};

/// SQLSTATE raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE raised on a serialization failure.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE raised when Postgres breaks a deadlock.
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE raised on a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors returned by ledger repositories.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A billing rule rejected the operation.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerError {
    /// Returns true if the database reported lock contention or a
    /// serialization conflict.
    #[must_use]
    pub fn is_contention(&self) -> bool {
        match self {
            Self::Billing(e) => e.is_retryable(),
            Self::Database(e) => matches!(
                sqlstate(e).as_deref(),
                Some(LOCK_NOT_AVAILABLE | SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
            ),
        }
    }

    /// Returns true if the database rejected a duplicate key.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Database(e) if sqlstate(e).as_deref() == Some(UNIQUE_VIOLATION))
    }
}

impl From<LedgerError> for BillingError {
    fn from(err: LedgerError) -> Self {
        if err.is_contention() {
            return Self::ConcurrentUpdate;
        }
        match err {
            LedgerError::Billing(e) => e,
            LedgerError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Extracts the Postgres SQLSTATE code from a database error, if any.
fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Query(r) | DbErr::Exec(r) | DbErr::Conn(r) => r,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Bounds every row-lock wait for the rest of the transaction.
pub(crate) async fn set_lock_timeout(
    txn: &DatabaseTransaction,
    lock_timeout_ms: u64,
) -> Result<(), DbErr> {
    txn.execute_unprepared(&format!("SET LOCAL lock_timeout = '{lock_timeout_ms}ms'"))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_billing_error_is_contention() {
        let err = LedgerError::Billing(BillingError::ConcurrentUpdate);
        assert!(err.is_contention());
        assert!(matches!(BillingError::from(err), BillingError::ConcurrentUpdate));
    }

    #[test]
    fn test_plain_db_error_maps_to_database() {
        let err = LedgerError::Database(DbErr::Custom("boom".to_string()));
        assert!(!err.is_contention());
        assert!(!err.is_unique_violation());
        assert!(matches!(BillingError::from(err), BillingError::Database(_)));
    }

    #[test]
    fn test_billing_error_passes_through() {
        let err = LedgerError::from(BillingError::EmptySelection);
        assert!(matches!(BillingError::from(err), BillingError::EmptySelection));
    }
}
