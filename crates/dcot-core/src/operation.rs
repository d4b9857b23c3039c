//! # Operations: the closed set of transitions
//!
//! One definition of every invocable operation, its wire name and its exact
//! argument arity. The dispatcher looks names up here and the state machine
//! matches on the enum exhaustively, so adding an operation forces every
//! consumer to handle it at compile time.
//!
//! | Operation | Arity | Arguments | Mutates |
//! |---|---|---|---|
//! | `initNewChain` | 1 | serialized draft record | yes |
//! | `startTransfer` | 2 | asset id, new custodian id | yes |
//! | `completeTransfer` | 1 | asset id | yes |
//! | `commentChain` | 2 | asset id, text | yes |
//! | `cancelTransfer` | 1 | asset id | yes |
//! | `terminateChain` | 1 | asset id | yes |
//! | `updateDocument` | 2 | asset id, new document id | yes |
//! | `getAssetDetails` | 1 | asset id | no |
//! | `getChainOfEvents` | 1 | asset id | no |

use serde::{Deserialize, Serialize};

/// Every operation the chaincode accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Create a new custody record.
    InitNewChain,
    /// Hand the asset to a designated recipient.
    StartTransfer,
    /// The designated recipient accepts the asset.
    CompleteTransfer,
    /// Annotate the record.
    CommentChain,
    /// Abort a pending transfer.
    CancelTransfer,
    /// End custody permanently.
    TerminateChain,
    /// Replace the document identifier.
    UpdateDocument,
    /// Read the current record.
    GetAssetDetails,
    /// Read every historical version of the record.
    GetChainOfEvents,
}

/// Number of operations. Used for table-size assertions.
pub const OPERATION_COUNT: usize = 9;

impl Operation {
    /// All operations in declaration order.
    pub fn all() -> &'static [Operation] {
        &[
            Self::InitNewChain,
            Self::StartTransfer,
            Self::CompleteTransfer,
            Self::CommentChain,
            Self::CancelTransfer,
            Self::TerminateChain,
            Self::UpdateDocument,
            Self::GetAssetDetails,
            Self::GetChainOfEvents,
        ]
    }

    /// Wire name used in invocations, events and audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitNewChain => "initNewChain",
            Self::StartTransfer => "startTransfer",
            Self::CompleteTransfer => "completeTransfer",
            Self::CommentChain => "commentChain",
            Self::CancelTransfer => "cancelTransfer",
            Self::TerminateChain => "terminateChain",
            Self::UpdateDocument => "updateDocument",
            Self::GetAssetDetails => "getAssetDetails",
            Self::GetChainOfEvents => "getChainOfEvents",
        }
    }

    /// Look an operation up by wire name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|op| op.as_str() == name)
    }

    /// Exact number of arguments the operation takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::StartTransfer | Self::CommentChain | Self::UpdateDocument => 2,
            Self::InitNewChain
            | Self::CompleteTransfer
            | Self::CancelTransfer
            | Self::TerminateChain
            | Self::GetAssetDetails
            | Self::GetChainOfEvents => 1,
        }
    }

    /// Whether a successful invocation writes the ledger.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::GetAssetDetails | Self::GetChainOfEvents)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
