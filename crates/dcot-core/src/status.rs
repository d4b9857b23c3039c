//! # Custody Status
//!
//! ```text
//! IN_CUSTODY ──startTransfer──▶ TRANSFER_PENDING
//!     ▲                              │
//!     └──completeTransfer / cancelTransfer──┘
//!     │
//!     └──terminateChain──▶ RELEASED (terminal)
//! ```
//!
//! The enum only describes which edges exist. Who may walk an edge is decided
//! by the transition handlers in `dcot-state`.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a custody record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyStatus {
    /// The asset is held by the custodian named in `deliveryMan`.
    InCustody,
    /// The asset is being handed to the recipient named in `deliveryMan`.
    TransferPending,
    /// Custody has ended. No transition leaves this status.
    Released,
}

impl CustodyStatus {
    /// All statuses in lifecycle order.
    pub fn all() -> &'static [CustodyStatus] {
        &[Self::InCustody, Self::TransferPending, Self::Released]
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InCustody => "IN_CUSTODY",
            Self::TransferPending => "TRANSFER_PENDING",
            Self::Released => "RELEASED",
        }
    }

    /// Parse a status from its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "IN_CUSTODY" => Some(Self::InCustody),
            "TRANSFER_PENDING" => Some(Self::TransferPending),
            "RELEASED" => Some(Self::Released),
            _ => None,
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released)
    }

    /// Statuses reachable from this one in a single transition.
    pub fn valid_transitions(&self) -> &'static [CustodyStatus] {
        match self {
            Self::InCustody => &[Self::TransferPending, Self::Released],
            Self::TransferPending => &[Self::InCustody],
            Self::Released => &[],
        }
    }

    /// Whether `to` is a legal next status.
    pub fn can_transition_to(&self, to: CustodyStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for CustodyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
