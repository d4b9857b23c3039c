//! # Custody Record and Audit Event
//!
//! [`CustodyRecord`] is the value persisted under an asset's ledger key. It
//! embeds the latest [`Event`]; earlier events live in earlier versions of
//! the same key, so the ledger's version history of that key is the audit
//! trail.
//!
//! ## Wire Format
//!
//! camelCase JSON with a fixed field order:
//!
//! ```json
//! {"id":"…","trackingId":"…","documentId":"…","weightOfParcel":1.5,
//!  "sortingCenterDestination":"…","distributionOfficeCode":"…",
//!  "distributionZone":"…","deliveryMan":"…","codeOwner":"…","text":"…",
//!  "status":"IN_CUSTODY",
//!  "event":{"caller":"…","role":"…","operation":"…","moment":"…"}}
//! ```
//!
//! Serialization is deterministic, so a record read back from the ledger
//! re-serializes to the exact bytes that were stored.

use serde::{Deserialize, Serialize};

use crate::error::CustodyError;
use crate::identity::AssetId;
use crate::status::CustodyStatus;

/// An audit entry describing the transition that produced a record version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id of the invoking party.
    pub caller: String,
    /// Role attribute of the invoking party.
    pub role: String,
    /// Wire name of the transition.
    pub operation: String,
    /// When the event was created (`YYYY-MM-DDTHH:MM:SSZ`).
    pub moment: String,
}

/// The asset under custody tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyRecord {
    /// Assigned at creation, immutable.
    pub id: AssetId,
    /// External tracking reference.
    pub tracking_id: String,
    /// External document reference; changed only by `updateDocument`.
    pub document_id: String,
    /// Parcel weight, opaque to the state machine.
    pub weight_of_parcel: f64,
    /// Pass-through descriptive attribute.
    pub sorting_center_destination: String,
    /// Pass-through descriptive attribute.
    pub distribution_office_code: String,
    /// Pass-through descriptive attribute.
    pub distribution_zone: String,
    /// Unique id of the current custodian (or pending recipient).
    pub delivery_man: String,
    /// Pass-through descriptive attribute.
    pub code_owner: String,
    /// Free-text annotation; changed only by `commentChain`.
    pub text: String,
    /// Lifecycle status.
    pub status: CustodyStatus,
    /// The event that produced this version.
    pub event: Event,
}

impl CustodyRecord {
    /// Build the first version of a record from a creation draft.
    ///
    /// Server-assigned fields are always taken from the arguments, never
    /// from the draft.
    pub fn from_draft(draft: CustodyDraft, id: AssetId, custodian: String, event: Event) -> Self {
        Self {
            id,
            tracking_id: draft.tracking_id,
            document_id: draft.document_id,
            weight_of_parcel: draft.weight_of_parcel,
            sorting_center_destination: draft.sorting_center_destination,
            distribution_office_code: draft.distribution_office_code,
            distribution_zone: draft.distribution_zone,
            delivery_man: custodian,
            code_owner: draft.code_owner,
            text: draft.text,
            status: CustodyStatus::InCustody,
            event,
        }
    }

    /// Serialize to the ledger wire format.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CustodyError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Serialize to the ledger wire format as a string.
    pub fn to_json_string(&self) -> Result<String, CustodyError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored record.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, CustodyError> {
        serde_json::from_slice(bytes)
            .map_err(|e| CustodyError::Serialization(format!("malformed custody record: {e}")))
    }
}

/// Input payload of `initNewChain`.
///
/// Every field is optional. Unknown fields, including the server-assigned
/// `id`, `status`, `deliveryMan` and `event`, are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustodyDraft {
    pub tracking_id: String,
    pub document_id: String,
    pub weight_of_parcel: f64,
    pub sorting_center_destination: String,
    pub distribution_office_code: String,
    pub distribution_zone: String,
    pub code_owner: String,
    pub text: String,
}

impl CustodyDraft {
    /// Parse a draft from the raw invocation argument.
    pub fn parse(raw: &str) -> Result<Self, CustodyError> {
        serde_json::from_str(raw)
            .map_err(|e| CustodyError::Serialization(format!("malformed draft record: {e}")))
    }
}
