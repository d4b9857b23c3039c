//! # Ledger Errors

use thiserror::Error;

use dcot_core::CustodyError;

/// Failures reported by the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A key read by the transaction was modified by a transaction that
    /// committed first.
    #[error(
        "MVCC read conflict on key {key:?}: read version {read_version:?}, \
         committed version {committed_version:?}"
    )]
    Conflict {
        /// The contended key.
        key: String,
        /// Block of the version the transaction read (`None` if absent).
        read_version: Option<u64>,
        /// Block of the version now committed.
        committed_version: Option<u64>,
    },

    /// A composite key component or state key is malformed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A value cannot be stored.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// An event name or payload is malformed.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Snapshot could not be read or written.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// The snapshot file moved past the height this ledger was loaded at.
    #[error("snapshot {path} is at height {on_disk}, ledger was loaded at {base_height}")]
    SnapshotConflict {
        path: String,
        base_height: u64,
        on_disk: u64,
    },

    /// Another process holds the snapshot's lock file.
    #[error("snapshot {0} is locked by another writer (remove {0}.lock if none is running)")]
    SnapshotLocked(String),
}

impl LedgerError {
    /// Whether resubmitting the transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::SnapshotConflict { .. } | Self::SnapshotLocked(_)
        )
    }
}

impl From<LedgerError> for CustodyError {
    fn from(err: LedgerError) -> Self {
        CustodyError::LedgerIo {
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

/// Failure to read an attribute from the caller's credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// The credential's attribute extension could not be decoded.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),
}
