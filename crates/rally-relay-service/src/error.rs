//! Service error types

use rally_relay_db::DbError;
use thiserror::Error;

/// Errors from the service layer
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
