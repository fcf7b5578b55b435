//! Error types for the database client

use bodywork_common::BodyworkError;
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A write was rejected by a uniqueness constraint
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored row could not be mapped back to a domain value
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Encrypting or decrypting a PII column failed
    #[error("PII cipher error: {0}")]
    Cipher(#[from] bodywork_config::SecretError),
}

impl DbError {
    /// Wraps a query failure, keeping unique violations distinguishable.
    pub(crate) fn from_query(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            DbError::ConstraintViolation(err.to_string())
        } else {
            DbError::QueryError(err.to_string())
        }
    }
}

impl From<DbError> for BodyworkError {
    fn from(err: DbError) -> Self {
        BodyworkError::StorageError(err.to_string())
    }
}

/// `true` for UNIQUE/PRIMARY KEY constraint failures.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

/// `true` for SQLite lock contention that is worth retrying (SQLITE_BUSY and friends).
pub fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            let code_busy = db
                .code()
                .map(|code| matches!(code.as_ref(), "5" | "6" | "261" | "262" | "517"))
                .unwrap_or(false);
            let message = db.message().to_ascii_lowercase();
            code_busy || message.contains("database is locked") || message.contains("busy")
        }
        _ => false,
    }
}
