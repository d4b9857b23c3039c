//! # In-Memory Reference Ledger
//!
//! A multi-version key/value store with Fabric's transaction semantics:
//! buffered writes, MVCC validation of the read set at commit, per-key
//! version history, and one chaincode event per committed transaction.
//!
//! Each commit produces one block. A key's version is the block number of
//! its latest write; a transaction that read a key at one version and
//! commits after another transaction moved it is rejected with
//! [`LedgerError::Conflict`] and none of its writes are applied.
//!
//! ## Persistence
//!
//! [`InMemoryLedger::save_snapshot()`] writes the full multi-version state
//! (every key's versions plus committed events) as pretty-printed JSON.
//! Saves go through a temporary file and a rename while holding a
//! `<path>.lock` file. [`InMemoryLedger::save_snapshot_over()`] also
//! refuses to overwrite a snapshot another process saved after this
//! ledger was loaded.
//! Stored values must be UTF-8; the chaincode only stores JSON documents.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use dcot_core::Timestamp;

use crate::error::LedgerError;
use crate::identity::ClientIdentity;
use crate::stub::{ChaincodeEvent, ChaincodeStub, HistoryIterator, KeyModification};

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx_id: String,
    /// Block number assigned to the transaction.
    pub block: u64,
    /// Number of keys written.
    pub writes: usize,
}

/// An event as recorded on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedEvent {
    pub tx_id: String,
    pub block: u64,
    pub name: String,
    #[serde(with = "utf8_bytes")]
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVersion {
    tx_id: String,
    block: u64,
    timestamp: Timestamp,
    #[serde(with = "utf8_bytes")]
    value: Vec<u8>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WorldState {
    height: u64,
    keys: BTreeMap<String, Vec<StoredVersion>>,
    events: Vec<CommittedEvent>,
}

impl WorldState {
    fn version_of(&self, key: &str) -> Option<u64> {
        self.keys.get(key).and_then(|v| v.last()).map(|v| v.block)
    }
}

/// Shared, thread-safe in-memory ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<WorldState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a transaction on behalf of `creator`.
    pub fn begin<'l>(&'l self, creator: impl ClientIdentity + 'l) -> LedgerTransaction<'l> {
        let tx_id = derive_tx_id(creator.id());
        tracing::trace!(tx_id = %tx_id, creator = creator.id(), "transaction opened");
        LedgerTransaction {
            ledger: self,
            tx_id,
            timestamp: Timestamp::now(),
            creator: Box::new(creator),
            read_set: BTreeMap::new(),
            write_set: BTreeMap::new(),
            event: None,
        }
    }

    /// Validate the transaction's read set and apply its writes and event.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Conflict`] if any key the transaction read
    /// has been rewritten since. Nothing is applied in that case.
    pub fn commit(&self, tx: LedgerTransaction<'_>) -> Result<CommitReceipt, LedgerError> {
        let mut state = self.state.write();
        for (key, read_version) in &tx.read_set {
            let committed_version = state.version_of(key);
            if committed_version != *read_version {
                tracing::debug!(tx_id = %tx.tx_id, key = %key.escape_debug(), "MVCC read conflict");
                return Err(LedgerError::Conflict {
                    key: key.clone(),
                    read_version: *read_version,
                    committed_version,
                });
            }
        }

        state.height += 1;
        let block = state.height;
        let writes = tx.write_set.len();
        for (key, value) in tx.write_set {
            state.keys.entry(key).or_default().push(StoredVersion {
                tx_id: tx.tx_id.clone(),
                block,
                timestamp: tx.timestamp,
                value,
            });
        }
        if let Some(event) = tx.event {
            state.events.push(CommittedEvent {
                tx_id: tx.tx_id.clone(),
                block,
                name: event.name,
                payload: event.payload,
            });
        }
        tracing::debug!(tx_id = %tx.tx_id, block, writes, "transaction committed");
        Ok(CommitReceipt {
            tx_id: tx.tx_id,
            block,
            writes,
        })
    }

    /// Number of committed blocks.
    pub fn height(&self) -> u64 {
        self.state.read().height
    }

    /// Latest committed value of a key.
    pub fn committed_value(&self, key: &str) -> Option<Vec<u8>> {
        self.state
            .read()
            .keys
            .get(key)
            .and_then(|v| v.last())
            .map(|v| v.value.clone())
    }

    /// Committed versions of a key, oldest first.
    pub fn history(&self, key: &str) -> Vec<KeyModification> {
        self.state
            .read()
            .keys
            .get(key)
            .map(|versions| versions.iter().map(to_modification).collect())
            .unwrap_or_default()
    }

    /// The `index`-th committed version of `key`, oldest first.
    fn version_at(&self, key: &str, index: usize) -> Option<KeyModification> {
        self.state.read().keys.get(key)?.get(index).map(to_modification)
    }

    /// All committed events in block order.
    pub fn events(&self) -> Vec<CommittedEvent> {
        self.state.read().events.clone()
    }

    /// Write the full multi-version state to `path` as JSON, replacing
    /// whatever the file holds.
    pub fn save_snapshot(&self, path: &Path) -> Result<(), LedgerError> {
        let _lock = SnapshotLock::acquire(path)?;
        self.write_snapshot(path)
    }

    /// Write the snapshot only if the file is still at `base_height`, the
    /// height it had when this ledger was loaded from it.
    ///
    /// # Errors
    ///
    /// [`LedgerError::SnapshotConflict`] if another writer saved in the
    /// meantime, [`LedgerError::SnapshotLocked`] if one is saving right now.
    /// The file is left untouched in both cases.
    pub fn save_snapshot_over(&self, path: &Path, base_height: u64) -> Result<(), LedgerError> {
        let _lock = SnapshotLock::acquire(path)?;
        let on_disk = if path.exists() {
            Self::load_snapshot(path)?.height()
        } else {
            0
        };
        if on_disk != base_height {
            tracing::warn!(path = %path.display(), base_height, on_disk, "snapshot moved");
            return Err(LedgerError::SnapshotConflict {
                path: path.display().to_string(),
                base_height,
                on_disk,
            });
        }
        self.write_snapshot(path)
    }

    /// Serialize into a temporary file beside `path`, then rename it over
    /// `path`. Readers see either the old or the new snapshot.
    fn write_snapshot(&self, path: &Path) -> Result<(), LedgerError> {
        let json = serde_json::to_vec_pretty(&*self.state.read())
            .map_err(|e| LedgerError::Snapshot(format!("encode: {e}")))?;
        let io_err =
            |e: std::io::Error| LedgerError::Snapshot(format!("write {}: {e}", path.display()));
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        tracing::debug!(path = %path.display(), "ledger snapshot saved");
        Ok(())
    }

    /// Load a ledger previously written by [`Self::save_snapshot()`].
    pub fn load_snapshot(path: &Path) -> Result<Self, LedgerError> {
        let bytes = std::fs::read(path)
            .map_err(|e| LedgerError::Snapshot(format!("read {}: {e}", path.display())))?;
        let state: WorldState = serde_json::from_slice(&bytes)
            .map_err(|e| LedgerError::Snapshot(format!("decode {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), height = state.height, "ledger snapshot loaded");
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Load the snapshot at `path` if it exists, otherwise start empty.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if path.exists() {
            Self::load_snapshot(path)
        } else {
            Ok(Self::new())
        }
    }
}

/// A transaction in progress against an [`InMemoryLedger`].
pub struct LedgerTransaction<'l> {
    ledger: &'l InMemoryLedger,
    tx_id: String,
    timestamp: Timestamp,
    creator: Box<dyn ClientIdentity + 'l>,
    read_set: BTreeMap<String, Option<u64>>,
    write_set: BTreeMap<String, Vec<u8>>,
    event: Option<ChaincodeEvent>,
}

impl LedgerTransaction<'_> {
    /// The event currently attached, if any.
    pub fn event(&self) -> Option<&ChaincodeEvent> {
        self.event.as_ref()
    }

    /// Number of buffered writes.
    pub fn pending_writes(&self) -> usize {
        self.write_set.len()
    }
}

impl std::fmt::Debug for LedgerTransaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerTransaction")
            .field("tx_id", &self.tx_id)
            .field("reads", &self.read_set.len())
            .field("writes", &self.write_set.len())
            .finish_non_exhaustive()
    }
}

impl ChaincodeStub for LedgerTransaction<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn creator(&self) -> &dyn ClientIdentity {
        self.creator.as_ref()
    }

    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        validate_key(key)?;
        let ledger = self.ledger;
        let state = ledger.state.read();
        let latest = state.keys.get(key).and_then(|v| v.last());
        self.read_set
            .entry(key.to_string())
            .or_insert_with(|| latest.map(|v| v.block));
        Ok(latest.map(|v| v.value.clone()))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        validate_key(key)?;
        if std::str::from_utf8(&value).is_err() {
            return Err(LedgerError::InvalidValue(format!(
                "value for key {:?} is not UTF-8",
                key
            )));
        }
        self.write_set.insert(key.to_string(), value);
        Ok(())
    }

    fn get_history_for_key(&self, key: &str) -> Result<HistoryIterator<'_>, LedgerError> {
        validate_key(key)?;
        let ledger = self.ledger;
        let committed = ledger.state.read().keys.get(key).map_or(0, Vec::len);
        let pending = self.write_set.get(key).map(|value| KeyModification {
            tx_id: self.tx_id.clone(),
            value: value.clone(),
            timestamp: self.timestamp,
        });
        let key = key.to_string();
        // Versions are append-only, so indices below `committed` stay valid.
        let versions = (0..committed).map(move |index| {
            ledger.version_at(&key, index).ok_or_else(|| {
                LedgerError::InvalidKey(format!("history of {key:?} lost version {index}"))
            })
        });
        Ok(HistoryIterator::new(versions.chain(pending.map(Ok))))
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError> {
        if name.is_empty() {
            return Err(LedgerError::InvalidEvent("event name must not be empty".to_string()));
        }
        if std::str::from_utf8(&payload).is_err() {
            return Err(LedgerError::InvalidEvent(format!("payload of {name} is not UTF-8")));
        }
        self.event = Some(ChaincodeEvent {
            name: name.to_string(),
            payload,
        });
        Ok(())
    }
}

/// Exclusive claim on a snapshot file, held as `<path>.lock` and released
/// on drop.
struct SnapshotLock {
    path: PathBuf,
}

impl SnapshotLock {
    fn acquire(snapshot: &Path) -> Result<Self, LedgerError> {
        let mut path = snapshot.as_os_str().to_owned();
        path.push(".lock");
        let path = PathBuf::from(path);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(LedgerError::SnapshotLocked(snapshot.display().to_string()))
            }
            Err(e) => Err(LedgerError::Snapshot(format!("lock {}: {e}", path.display()))),
        }
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "snapshot lock not removed");
        }
    }
}

fn validate_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        return Err(LedgerError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

fn to_modification(v: &StoredVersion) -> KeyModification {
    KeyModification {
        tx_id: v.tx_id.clone(),
        value: v.value.clone(),
        timestamp: v.timestamp,
    }
}

/// Hex SHA-256 of a random nonce followed by the creator's id.
fn derive_tx_id(creator_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    hasher.update(creator_id.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

mod utf8_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let s = std::str::from_utf8(bytes).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(String::deserialize(deserializer)?.into_bytes())
    }
}
