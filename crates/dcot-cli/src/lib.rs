//! # dcot-cli — Chain-of-Custody Command Line
//!
//! Drives the chaincode against a ledger persisted as a JSON snapshot.
//!
//! ## Subcommands
//!
//! - `dcot init`: Create an empty ledger snapshot.
//! - `dcot invoke`: Submit a transaction; commits on success.
//! - `dcot query`: Evaluate a transaction without committing.
//! - `dcot history`: Raw version history of an asset's ledger key.
//! - `dcot events`: Committed chaincode events.
//!
//! ```bash
//! dcot init
//! dcot invoke --role member --uid m1 initNewChain '{"documentId":"doc-1"}'
//! dcot invoke --role member --uid m1 startTransfer <assetId> m2
//! dcot query --role administrator --uid a1 getChainOfEvents <assetId>
//! ```

pub mod inspect;
pub mod invoke;
pub mod ledger;

use std::path::Path;

use anyhow::{Context, Result};

use dcot_chaincode::ChaincodeConfig;

/// Snapshot file used when `--ledger` is not given.
pub const DEFAULT_LEDGER_PATH: &str = "dcot-ledger.json";

/// Load configuration from `path` (defaults if absent), then apply
/// `DCOT_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ChaincodeConfig> {
    let config = match path {
        Some(path) => ChaincodeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ChaincodeConfig::default(),
    };
    let config = config
        .with_env_overrides()
        .context("applying environment overrides")?;
    tracing::debug!(
        role_exclusion = %config.role_exclusion,
        role_attribute = %config.role_attribute,
        uid_attribute = %config.uid_attribute,
        "configuration loaded"
    );
    Ok(config)
}
