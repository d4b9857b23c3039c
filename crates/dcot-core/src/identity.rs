//! # Identity Types
//!
//! Newtypes for the identifiers a transition handles, and the caller's
//! resolved identity.
//!
//! Role names arrive from credential attributes as free text. They are kept
//! verbatim in [`CallerIdentity`] (audit events record exactly what the
//! credential said) and parsed into [`Role`] only for comparisons, so an
//! empty or unknown role never matches any of the four known roles.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CustodyError;

/// Identifier of a custody record.
///
/// Assigned once by `initNewChain` and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Generate a fresh random asset identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a caller-supplied identifier, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, CustodyError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CustodyError::Validation(
                "asset id must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller roles recognised by the access rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creates custody chains.
    Member,
    /// Oversees every chain; reads history, updates documents.
    Administrator,
    /// Reads asset details.
    Operator,
    /// Carries parcels; reads asset details.
    DeliveryOperator,
}

impl Role {
    /// All roles.
    pub fn all() -> &'static [Role] {
        &[
            Self::Member,
            Self::Administrator,
            Self::Operator,
            Self::DeliveryOperator,
        ]
    }

    /// Attribute value carried in the credential for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Administrator => "administrator",
            Self::Operator => "operator",
            Self::DeliveryOperator => "delivery_operator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CustodyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "administrator" => Ok(Self::Administrator),
            "operator" => Ok(Self::Operator),
            "delivery_operator" => Ok(Self::DeliveryOperator),
            other => Err(CustodyError::Validation(format!("unknown role: {other:?}"))),
        }
    }
}

/// The invoking party, as resolved from its credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    role_name: String,
    caller_id: String,
    operator_flag: bool,
}

impl CallerIdentity {
    /// Build an identity from raw attribute values.
    pub fn new(role_name: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            caller_id: caller_id.into(),
            operator_flag: false,
        }
    }

    /// Attach the operator capability read by the dispatcher.
    ///
    /// Carried for diagnostics only; no access rule reads it.
    pub fn with_operator_flag(mut self, flag: bool) -> Self {
        self.operator_flag = flag;
        self
    }

    /// Role attribute exactly as the credential carried it (may be empty).
    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    /// The caller's unique id.
    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    /// The operator capability flag.
    pub fn operator_flag(&self) -> bool {
        self.operator_flag
    }

    /// The parsed role, `None` for empty or unknown role names.
    pub fn role(&self) -> Option<Role> {
        self.role_name.parse().ok()
    }

    /// Whether the caller holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    /// Whether the caller holds any of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role().is_some_and(|r| roles.contains(&r))
    }

    /// Whether the caller is the custodian `delivery_man`.
    pub fn is_custodian(&self, delivery_man: &str) -> bool {
        self.caller_id == delivery_man
    }
}
