//! Database error types

use thiserror::Error;

/// Errors from the persistence layer
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
}

/// Result type for persistence operations
pub type DbResult<T> = Result<T, DbError>;
