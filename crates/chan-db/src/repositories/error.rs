//! Error handling utilities for repositories

use chan_core::error::DomainError;
use sqlx::Error as SqlxError;

/// serialization_failure
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";
/// deadlock_detected
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// Whether the error is a transaction conflict that is safe to retry
pub fn is_serialization_failure(e: &SqlxError) -> bool {
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| {
            code == SQLSTATE_SERIALIZATION_FAILURE || code == SQLSTATE_DEADLOCK_DETECTED
        })
}

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    if is_serialization_failure(&e) {
        return DomainError::conflict(e.to_string());
    }
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    map_db_error(e)
}
