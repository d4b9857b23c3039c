//! # Identity Resolution
//!
//! Turns the caller's credential into a [`CallerIdentity`]. Two attributes
//! are consumed: the role and the unique id. A missing role is tolerated
//! (the handlers reject the empty role where it matters); a missing unique
//! id is fatal.

use dcot_core::{CallerIdentity, CustodyError};
use dcot_ledger::{AttributeError, ClientIdentity};

/// Reads caller attributes by configurable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolver {
    role_attribute: String,
    uid_attribute: String,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new("role", "uid")
    }
}

impl IdentityResolver {
    pub fn new(role_attribute: impl Into<String>, uid_attribute: impl Into<String>) -> Self {
        Self {
            role_attribute: role_attribute.into(),
            uid_attribute: uid_attribute.into(),
        }
    }

    pub fn role_attribute(&self) -> &str {
        &self.role_attribute
    }

    pub fn uid_attribute(&self) -> &str {
        &self.uid_attribute
    }

    /// Resolve the caller's role and unique id.
    ///
    /// # Errors
    ///
    /// [`CustodyError::Identity`] if an attribute lookup fails or the
    /// credential carries no unique id.
    pub fn resolve(&self, identity: &dyn ClientIdentity) -> Result<CallerIdentity, CustodyError> {
        let role = identity
            .attribute(&self.role_attribute)
            .map_err(lookup_failed)?;
        let role = match role {
            Some(role) => role,
            None => {
                tracing::warn!(
                    attribute = %self.role_attribute,
                    "role attribute not found in caller credential"
                );
                String::new()
            }
        };

        let uid = identity
            .attribute(&self.uid_attribute)
            .map_err(lookup_failed)?
            .ok_or_else(|| {
                CustodyError::Identity(format!(
                    "unique id attribute `{}` not found in caller credential",
                    self.uid_attribute
                ))
            })?;

        Ok(CallerIdentity::new(role, uid))
    }

    /// Look up an arbitrary attribute, returning whether it is present and
    /// its value (empty when absent).
    pub fn is_operator_attribute(
        &self,
        identity: &dyn ClientIdentity,
        name: &str,
    ) -> Result<(bool, String), CustodyError> {
        let value = identity.attribute(name).map_err(lookup_failed)?;
        Ok(match value {
            Some(v) => (true, v),
            None => (false, String::new()),
        })
    }
}

fn lookup_failed(err: AttributeError) -> CustodyError {
    CustodyError::Identity(format!("attribute lookup failed: {err}"))
}
