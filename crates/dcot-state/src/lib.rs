//! # dcot-state — Custody State Machine
//!
//! Implements the chain-of-custody lifecycle on top of the ledger seam:
//!
//! ```text
//! initNewChain ──▶ IN_CUSTODY ──startTransfer──▶ TRANSFER_PENDING
//!                    ▲   │                          │
//!                    │   │  completeTransfer /      │
//!                    │   │  cancelTransfer          │
//!                    │   └──────────◀───────────────┘
//!                    │
//!                    └──terminateChain──▶ RELEASED (terminal)
//! ```
//!
//! - [`resolver`]: caller role and unique id from the client credential.
//! - [`event`]: audit [`Event`](dcot_core::Event) construction with an
//!   injectable clock.
//! - [`store`]: the custody record's ledger key, reads, writes and history.
//! - [`policy`]: whether role exclusions are enforced on
//!   `completeTransfer` and `commentChain`.
//! - [`workflow`]: the nine transitions and their precondition checks.

pub mod event;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod workflow;

pub use event::{Clock, EventRecorder, FixedClock, SystemClock};
pub use policy::RoleExclusionPolicy;
pub use resolver::IdentityResolver;
pub use store::{CustodyHistory, CustodyStore, RecordKey, CUSTODY_OBJECT_TYPE};
pub use workflow::CustodyWorkflow;
