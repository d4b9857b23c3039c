//! # Role Exclusion Policy
//!
//! `completeTransfer` must not be run by a member or an administrator, and
//! `commentChain` must not be run by a member. Deployments that depend on
//! the historical behaviour, where neither exclusion was enforced, can opt
//! into [`RoleExclusionPolicy::Legacy`].

use serde::{Deserialize, Serialize};

/// Whether role exclusions on `completeTransfer` and `commentChain` apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleExclusionPolicy {
    /// Exclusions are enforced.
    #[default]
    Strict,
    /// Exclusions are logged but not enforced.
    Legacy,
}

impl RoleExclusionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Legacy => "legacy",
        }
    }

    /// Parse a policy from its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(Self::Strict),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }

    pub fn enforces_exclusions(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl std::fmt::Display for RoleExclusionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
