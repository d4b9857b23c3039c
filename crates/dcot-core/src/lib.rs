//! # dcot-core — Foundational Types for the Chain-of-Custody Chaincode
//!
//! Defines the vocabulary shared by every other crate in the workspace: the
//! custody record persisted on the ledger, the audit event embedded in it,
//! the closed sets of roles, statuses and operations, and the error
//! hierarchy every transition reports through.
//!
//! ## Key Design Principles
//!
//! 1. **Closed enums for every string-typed concept.** `CustodyStatus`,
//!    `Role` and `Operation` are exhaustive enums with `as_str()` and a
//!    parser. Wire strings only exist at the serialization boundary.
//!
//! 2. **Deterministic serialization.** `CustodyRecord` serializes with a
//!    fixed field order, so persisting and re-reading a record yields
//!    byte-identical JSON.
//!
//! 3. **UTC-only timestamps.** Audit moments are rendered as
//!    `YYYY-MM-DDTHH:MM:SSZ` through [`Timestamp`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dcot-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod operation;
pub mod record;
pub mod status;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::{CustodyError, StateError};
pub use identity::{AssetId, CallerIdentity, Role};
pub use operation::{Operation, OPERATION_COUNT};
pub use record::{CustodyDraft, CustodyRecord, Event};
pub use status::CustodyStatus;
pub use temporal::Timestamp;
