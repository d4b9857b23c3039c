//! # dcot-ledger — The Ledger Seam
//!
//! The custody state machine never talks to a storage engine directly. It
//! consumes the ledger through [`ChaincodeStub`] (state, history, events,
//! composite keys) and the caller's credential through [`ClientIdentity`].
//! Both are object-safe traits so a host platform can supply its own
//! implementation.
//!
//! ## Reference Implementation
//!
//! [`InMemoryLedger`] implements the platform side for local use and tests:
//!
//! - Writes are buffered in a [`LedgerTransaction`] and applied at commit.
//! - Reads observe committed state and are recorded in a read set.
//! - Commit re-validates the read set (MVCC). A stale read is a
//!   [`LedgerError::Conflict`] and nothing is applied.
//! - Every committed write is appended to the key's version history.
//! - At most one chaincode event is kept per transaction.
//! - The whole multi-version state can be saved to and loaded from a JSON
//!   snapshot file.

pub mod composite;
pub mod error;
pub mod identity;
pub mod memory;
pub mod stub;

pub use composite::create_composite_key;
pub use error::{AttributeError, LedgerError};
pub use identity::{ClientIdentity, StaticIdentity};
pub use memory::{CommitReceipt, CommittedEvent, InMemoryLedger, LedgerTransaction};
pub use stub::{ChaincodeEvent, ChaincodeStub, HistoryIterator, KeyModification};
