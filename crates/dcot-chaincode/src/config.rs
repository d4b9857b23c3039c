//! # Chaincode Configuration
//!
//! Loaded from YAML, then overridden from the environment:
//!
//! | Field | Env var | Default |
//! |---|---|---|
//! | `role_exclusion` | `DCOT_ROLE_EXCLUSION` | `strict` |
//! | `role_attribute` | `DCOT_ROLE_ATTRIBUTE` | `role` |
//! | `uid_attribute` | `DCOT_UID_ATTRIBUTE` | `uid` |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dcot_state::{CustodyWorkflow, EventRecorder, IdentityResolver, RoleExclusionPolicy};

pub const ENV_ROLE_EXCLUSION: &str = "DCOT_ROLE_EXCLUSION";
pub const ENV_ROLE_ATTRIBUTE: &str = "DCOT_ROLE_ATTRIBUTE";
pub const ENV_UID_ATTRIBUTE: &str = "DCOT_UID_ATTRIBUTE";

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("invalid value {value:?} for {field}")]
    InvalidValue { field: &'static str, value: String },
}

/// Runtime settings of the chaincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChaincodeConfig {
    /// Whether role exclusions on `completeTransfer` and `commentChain`
    /// are enforced.
    pub role_exclusion: RoleExclusionPolicy,
    /// Credential attribute holding the caller's role.
    pub role_attribute: String,
    /// Credential attribute holding the caller's unique id.
    pub uid_attribute: String,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            role_exclusion: RoleExclusionPolicy::default(),
            role_attribute: "role".to_string(),
            uid_attribute: "uid".to_string(),
        }
    }
}

impl ChaincodeConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply `DCOT_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ROLE_EXCLUSION) {
            self.role_exclusion = RoleExclusionPolicy::from_name(value.trim()).ok_or(
                ConfigError::InvalidValue {
                    field: "role_exclusion",
                    value,
                },
            )?;
        }
        if let Some(value) = lookup(ENV_ROLE_ATTRIBUTE) {
            self.role_attribute = value;
        }
        if let Some(value) = lookup(ENV_UID_ATTRIBUTE) {
            self.uid_attribute = value;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.role_attribute.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "role_attribute",
                value: String::new(),
            });
        }
        if self.uid_attribute.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "uid_attribute",
                value: String::new(),
            });
        }
        Ok(())
    }

    pub fn resolver(&self) -> IdentityResolver {
        IdentityResolver::new(&self.role_attribute, &self.uid_attribute)
    }

    pub fn workflow(&self) -> CustodyWorkflow {
        CustodyWorkflow::new(self.role_exclusion, EventRecorder::default())
    }
}
