//! Error types for the account ledger.
//!
//! All driver-level failures are translated into this taxonomy at the store
//! boundary via `From<sqlx::Error>`; sqlx error types never reach callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("connectivity error: {message}")]
    Connectivity { message: String },

    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("invalid transaction state: {message} (boundary: {boundary_id})")]
    InvalidState {
        message: String,
        boundary_id: String,
    },

    #[error("transfer failed: {source}")]
    TransferFailed {
        #[source]
        source: Box<LedgerError>,
    },
}

impl LedgerError {
    /// Create a not-found error for the given record id.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a constraint violation error.
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Create a connectivity error.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation_failed(reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid-state error for a transaction boundary.
    pub fn invalid_state(message: impl Into<String>, boundary_id: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
            boundary_id: boundary_id.into(),
        }
    }

    /// Wrap a failure that already triggered a rollback.
    pub fn transfer_failed(source: LedgerError) -> Self {
        Self::TransferFailed {
            source: Box::new(source),
        }
    }

    /// The original cause of a failed transfer, if this is one.
    pub fn transfer_cause(&self) -> Option<&LedgerError> {
        match self {
            Self::TransferFailed { source } => Some(source),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

/// Translate sqlx errors into the ledger taxonomy.
///
/// Called once at the store boundary. Duplicate-key failures become
/// `ConstraintViolation`; pool and transport failures become `Connectivity`.
impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    LedgerError::constraint_violation(db_err.message())
                } else {
                    LedgerError::connectivity(db_err.message())
                }
            }
            sqlx::Error::PoolTimedOut => {
                LedgerError::connectivity("timed out acquiring a pooled connection")
            }
            sqlx::Error::PoolClosed => LedgerError::connectivity("connection pool is closed"),
            sqlx::Error::Io(io_err) => LedgerError::connectivity(format!("I/O error: {}", io_err)),
            sqlx::Error::Protocol(msg) => {
                LedgerError::connectivity(format!("protocol error: {}", msg))
            }
            sqlx::Error::Configuration(msg) => {
                LedgerError::connectivity(format!("configuration error: {}", msg))
            }
            sqlx::Error::WorkerCrashed => LedgerError::connectivity("database worker crashed"),
            other => LedgerError::connectivity(other.to_string()),
        }
    }
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = LedgerError::not_found("memberA");
        assert!(err.to_string().contains("memberA"));
    }

    #[test]
    fn test_transfer_failed_exposes_cause() {
        let cause = LedgerError::validation_failed("blocked destination");
        let err = LedgerError::transfer_failed(cause);
        assert!(matches!(
            err.transfer_cause(),
            Some(LedgerError::ValidationFailed { .. })
        ));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_retryable() {
        assert!(LedgerError::connectivity("socket reset").is_retryable());
        assert!(!LedgerError::not_found("x").is_retryable());
        assert!(!LedgerError::validation_failed("blocked").is_retryable());
    }

    #[test]
    fn test_pool_closed_maps_to_connectivity() {
        let err: LedgerError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, LedgerError::Connectivity { .. }));
    }

    #[test]
    fn test_row_not_found_maps_to_connectivity() {
        // The store never relies on RowNotFound; it uses fetch_optional and
        // raises NotFound itself with the record id.
        let err: LedgerError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, LedgerError::Connectivity { .. }));
    }

    #[test]
    fn test_invalid_state_mentions_boundary() {
        let err = LedgerError::invalid_state("boundary already active", "tx_abc");
        assert!(err.to_string().contains("tx_abc"));
    }
}
