//! Shared fixtures for the cross-crate tests.

use std::sync::Arc;

use dcot_chaincode::{Dispatcher, Gateway, Response};
use dcot_core::CustodyRecord;
use dcot_ledger::{create_composite_key, InMemoryLedger, StaticIdentity};
use dcot_state::{
    CustodyWorkflow, EventRecorder, IdentityResolver, RoleExclusionPolicy, CUSTODY_OBJECT_TYPE,
};

/// A gateway over a fresh ledger plus shorthand for common calls.
#[derive(Debug, Clone)]
pub struct Harness {
    pub gateway: Gateway,
}

impl Default for Harness {
    fn default() -> Self {
        Self::with_policy(RoleExclusionPolicy::Strict)
    }
}

impl Harness {
    pub fn with_policy(policy: RoleExclusionPolicy) -> Self {
        Self::on_ledger(Arc::new(InMemoryLedger::new()), policy)
    }

    pub fn on_ledger(ledger: Arc<InMemoryLedger>, policy: RoleExclusionPolicy) -> Self {
        let dispatcher = Dispatcher::new(
            IdentityResolver::default(),
            CustodyWorkflow::new(policy, EventRecorder::default()),
        );
        Self {
            gateway: Gateway::new(ledger, dispatcher),
        }
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        self.gateway.ledger()
    }

    pub fn submit(&self, role: &str, uid: &str, function: &str, a: &[&str]) -> Response {
        self.gateway.submit(identity(role, uid), function, &args(a))
    }

    pub fn evaluate(&self, role: &str, uid: &str, function: &str, a: &[&str]) -> Response {
        self.gateway.evaluate(identity(role, uid), function, &args(a))
    }

    /// Create an asset as member `uid` and return its id.
    pub fn create(&self, uid: &str, document_id: &str) -> String {
        let draft = serde_json::json!({
            "trackingId": format!("TRK-{uid}"),
            "documentId": document_id,
            "weightOfParcel": 2.5,
            "sortingCenterDestination": "Torino",
            "distributionOfficeCode": "TO-1",
            "distributionZone": "north",
            "codeOwner": "owner-1",
            "text": "",
        })
        .to_string();
        let response = self.submit("member", uid, "initNewChain", &[&draft]);
        let payload = response
            .payload()
            .unwrap_or_else(|| panic!("initNewChain failed: {response:?}"));
        parse_record(payload).id.to_string()
    }

    /// The committed record, if any.
    pub fn record(&self, asset_id: &str) -> Option<CustodyRecord> {
        self.ledger()
            .committed_value(&key(asset_id))
            .map(|bytes| CustodyRecord::from_json_bytes(&bytes).unwrap_or_else(|e| panic!("{e}")))
    }

    /// Raw committed bytes of the record.
    pub fn stored_bytes(&self, asset_id: &str) -> Option<Vec<u8>> {
        self.ledger().committed_value(&key(asset_id))
    }

    /// Number of committed versions of the record.
    pub fn versions(&self, asset_id: &str) -> usize {
        self.ledger().history(&key(asset_id)).len()
    }
}

/// A credential with the default `role` and `uid` attributes.
pub fn identity(role: &str, uid: &str) -> StaticIdentity {
    StaticIdentity::with_role_and_uid(role, uid)
}

pub fn args(a: &[&str]) -> Vec<String> {
    a.iter().map(|s| s.to_string()).collect()
}

/// Ledger key of an asset.
pub fn key(asset_id: &str) -> String {
    create_composite_key(CUSTODY_OBJECT_TYPE, &[asset_id]).unwrap_or_else(|e| panic!("{e}"))
}

pub fn parse_record(payload: &str) -> CustodyRecord {
    CustodyRecord::from_json_bytes(payload.as_bytes()).unwrap_or_else(|e| panic!("{e}: {payload}"))
}
