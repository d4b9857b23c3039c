//! # Client Identity
//!
//! Read access to the attributes embedded in the invoking party's
//! credential. The chaincode derives role and unique id from these; it
//! never sees the credential itself.

use std::collections::BTreeMap;

use crate::error::AttributeError;

/// The invoking party's credential, as exposed by the platform.
pub trait ClientIdentity: Send + Sync {
    /// A platform-assigned identifier for the credential holder.
    fn id(&self) -> &str;

    /// Look up a named attribute.
    ///
    /// `Ok(None)` means the credential carries no such attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError`] if the credential cannot be decoded.
    fn attribute(&self, name: &str) -> Result<Option<String>, AttributeError>;
}

/// A credential whose attributes are fixed at construction.
///
/// Used by the CLI and tests; a `broken` identity simulates a credential
/// whose attribute extension cannot be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    id: String,
    attributes: BTreeMap<String, String>,
    broken: Option<String>,
}

impl StaticIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Add or replace an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// A credential carrying the conventional `role` and `uid` attributes.
    pub fn with_role_and_uid(role: &str, uid: &str) -> Self {
        Self::new(uid)
            .with_attribute("role", role)
            .with_attribute("uid", uid)
    }

    /// A credential whose every attribute lookup fails.
    pub fn broken(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
            broken: Some(reason.into()),
        }
    }
}

impl ClientIdentity for StaticIdentity {
    fn id(&self) -> &str {
        &self.id
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, AttributeError> {
        if let Some(reason) = &self.broken {
            return Err(AttributeError::MalformedCredential(reason.clone()));
        }
        Ok(self.attributes.get(name).cloned())
    }
}
