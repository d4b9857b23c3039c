//! # Chaincode Stub
//!
//! The per-transaction view of the ledger handed to the chaincode. One
//! stub instance serves exactly one invocation.

use dcot_core::Timestamp;

use crate::composite;
use crate::error::LedgerError;
use crate::identity::ClientIdentity;

/// One committed version of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    /// Transaction that wrote this version.
    pub tx_id: String,
    /// The value written.
    pub value: Vec<u8>,
    /// Commit time of the writing transaction.
    pub timestamp: Timestamp,
}

/// A chaincode event attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodeEvent {
    pub name: String,
    pub payload: Vec<u8>,
}

/// A single-pass iterator over the versions of one key, oldest first.
///
/// Not restartable; obtain a new iterator to re-read the history.
pub struct HistoryIterator<'a> {
    inner: Box<dyn Iterator<Item = Result<KeyModification, LedgerError>> + 'a>,
}

impl<'a> HistoryIterator<'a> {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<KeyModification, LedgerError>> + 'a,
    {
        Self {
            inner: Box::new(iter),
        }
    }

    /// An iterator yielding nothing.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for HistoryIterator<'_> {
    type Item = Result<KeyModification, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for HistoryIterator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryIterator").finish_non_exhaustive()
    }
}

/// Transaction-scoped access to world state, history and events.
pub trait ChaincodeStub {
    /// Identifier of the current transaction.
    fn tx_id(&self) -> &str;

    /// The invoking party's credential.
    fn creator(&self) -> &dyn ClientIdentity;

    /// Read the committed value of a key. Writes buffered by the current
    /// transaction are not visible.
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Buffer a write, applied only if the transaction commits.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// All versions of a key, oldest first, including the value this
    /// transaction has buffered for it.
    fn get_history_for_key(&self, key: &str) -> Result<HistoryIterator<'_>, LedgerError>;

    /// Attach an event to the transaction, replacing any earlier one.
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError>;

    /// Build a composite key. See [`composite::create_composite_key`].
    fn create_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<String, LedgerError> {
        composite::create_composite_key(object_type, attributes)
    }
}
