//! # Custody Record Store
//!
//! Maps asset ids onto ledger keys and custody records onto stored bytes.
//! Every record lives under the composite key
//! `U+0000 DCoT_ChainOfCustodyKey U+0000 <assetId> U+0000`; the ledger's
//! version history of that key is the record's audit trail.

use dcot_core::{AssetId, CustodyError, CustodyRecord, Operation, StateError};
use dcot_ledger::{ChaincodeStub, HistoryIterator};

/// Composite-key object type under which custody records are stored.
pub const CUSTODY_OBJECT_TYPE: &str = "DCoT_ChainOfCustodyKey";

/// The ledger key of one custody record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    asset_id: AssetId,
    composite: String,
}

impl RecordKey {
    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    /// The raw ledger key.
    pub fn as_str(&self) -> &str {
        &self.composite
    }
}

/// Record-level access to one transaction's ledger view.
pub struct CustodyStore<'s> {
    stub: &'s mut dyn ChaincodeStub,
}

impl<'s> CustodyStore<'s> {
    pub fn new(stub: &'s mut dyn ChaincodeStub) -> Self {
        Self { stub }
    }

    pub fn tx_id(&self) -> &str {
        self.stub.tx_id()
    }

    /// Derive the ledger key of an asset.
    pub fn key_for(&self, asset_id: &AssetId) -> Result<RecordKey, CustodyError> {
        let composite = self
            .stub
            .create_composite_key(CUSTODY_OBJECT_TYPE, &[asset_id.as_str()])?;
        Ok(RecordKey {
            asset_id: asset_id.clone(),
            composite,
        })
    }

    /// Read the committed record.
    ///
    /// # Errors
    ///
    /// [`StateError::NotFound`] if nothing is stored under the key,
    /// [`CustodyError::Serialization`] if the stored bytes are malformed.
    pub fn read(&mut self, key: &RecordKey) -> Result<CustodyRecord, CustodyError> {
        let bytes = self.stub.get_state(key.as_str())?.ok_or_else(|| StateError::NotFound {
            asset_id: key.asset_id.to_string(),
        })?;
        CustodyRecord::from_json_bytes(&bytes)
    }

    /// Whether a committed record exists under the key.
    pub fn exists(&mut self, key: &RecordKey) -> Result<bool, CustodyError> {
        Ok(self.stub.get_state(key.as_str())?.is_some())
    }

    /// Buffer a write of `record`, returning its serialized form.
    pub fn write(
        &mut self,
        key: &RecordKey,
        record: &CustodyRecord,
    ) -> Result<String, CustodyError> {
        let json = record.to_json_string()?;
        self.stub.put_state(key.as_str(), json.clone().into_bytes())?;
        Ok(json)
    }

    /// Emit the notification for a successful transition.
    pub fn notify(&mut self, operation: Operation, payload: &str) -> Result<(), CustodyError> {
        self.stub
            .set_event(operation.as_str(), payload.as_bytes().to_vec())?;
        Ok(())
    }

    /// Every version of the record, oldest first.
    pub fn history(&self, key: &RecordKey) -> Result<CustodyHistory<'_>, CustodyError> {
        Ok(CustodyHistory {
            inner: self.stub.get_history_for_key(key.as_str())?,
        })
    }
}

/// Lazily decoded record versions. Single pass.
#[derive(Debug)]
pub struct CustodyHistory<'a> {
    inner: HistoryIterator<'a>,
}

impl Iterator for CustodyHistory<'_> {
    type Item = Result<CustodyRecord, CustodyError>;

    fn next(&mut self) -> Option<Self::Item> {
        let modification = self.inner.next()?;
        Some(
            modification
                .map_err(CustodyError::from)
                .and_then(|m| CustodyRecord::from_json_bytes(&m.value)),
        )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use dcot_ledger::{InMemoryLedger, StaticIdentity};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn distinct_asset_ids_never_share_a_key(
            a in "[A-Za-z0-9_-]{1,24}",
            b in "[A-Za-z0-9_-]{1,24}",
        ) {
            let ledger = InMemoryLedger::new();
            let mut tx = ledger.begin(StaticIdentity::with_role_and_uid("member", "m1"));
            let store = CustodyStore::new(&mut tx);
            let ka = store.key_for(&AssetId::new(a.clone()).unwrap()).unwrap();
            let kb = store.key_for(&AssetId::new(b.clone()).unwrap()).unwrap();
            prop_assert_eq!(a == b, ka == kb);
            prop_assert!(
                ka.as_str().starts_with("\u{0}DCoT_ChainOfCustodyKey\u{0}"),
                "composite key missing DCoT_ChainOfCustodyKey prefix"
            );
            prop_assert_eq!(ka.asset_id().as_str(), a.as_str());
        }
    }
}
