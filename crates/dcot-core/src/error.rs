//! # Custody Errors
//!
//! Every transition failure is reported as a [`CustodyError`]. The variants
//! map one-to-one onto the failure kinds a caller can observe:
//!
//! | Variant | Code | Raised when |
//! |---|---|---|
//! | `Validation` | `VALIDATION_ERROR` | wrong argument count, empty required field |
//! | `Identity` | `IDENTITY_ERROR` | credential attribute lookup failed |
//! | `Authorization` | `AUTHORIZATION_ERROR` | role or custodian mismatch |
//! | `State` | `STATE_ERROR` | record missing/present, status precondition unmet |
//! | `Serialization` | `SERIALIZATION_ERROR` | malformed stored or input record |
//! | `LedgerIo` | `LEDGER_IO_ERROR` | ledger read/write/history failure, write conflict |
//!
//! Nothing at this layer is retried. `is_retryable()` only flags ledger write
//! conflicts so the caller can decide to resubmit.

use thiserror::Error;

use crate::status::CustodyStatus;

/// Top-level error type for custody transitions.
#[derive(Error, Debug)]
pub enum CustodyError {
    /// Malformed request: wrong arity or an empty required field.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller's credential attributes could not be resolved.
    #[error("identity error: {0}")]
    Identity(String),

    /// The caller's role or custodianship does not permit the transition.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// The record's existence or status does not permit the transition.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The ledger rejected a read, write or history call.
    #[error("ledger error: {message}")]
    LedgerIo {
        /// Human-readable description from the ledger.
        message: String,
        /// Whether resubmitting the transaction may succeed (write conflicts).
        retryable: bool,
    },
}

impl CustodyError {
    /// Machine-readable error code, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Identity(_) => "IDENTITY_ERROR",
            Self::Authorization(_) => "AUTHORIZATION_ERROR",
            Self::State(_) => "STATE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::LedgerIo { .. } => "LEDGER_IO_ERROR",
        }
    }

    /// Whether the failure is a transient ledger conflict.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerIo { retryable: true, .. })
    }

    /// Whether the failure reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::State(StateError::NotFound { .. }))
    }
}

impl From<serde_json::Error> for CustodyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors about the record's existence or lifecycle status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No record is stored under the asset's key.
    #[error("asset {asset_id} not found")]
    NotFound {
        /// The asset identifier that was looked up.
        asset_id: String,
    },

    /// A record is already stored under the asset's key.
    #[error("asset {asset_id} already exists")]
    AlreadyExists {
        /// The colliding asset identifier.
        asset_id: String,
    },

    /// The record's status does not satisfy the transition's precondition.
    #[error("{operation} requires status {expected}, asset {asset_id} is {actual}")]
    InvalidStatus {
        /// The asset identifier.
        asset_id: String,
        /// The transition that was attempted.
        operation: String,
        /// The status the transition requires.
        expected: CustodyStatus,
        /// The record's current status.
        actual: CustodyStatus,
    },
}
