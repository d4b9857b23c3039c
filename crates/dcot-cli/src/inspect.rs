//! # Ledger Inspection Subcommands
//!
//! Read-only views straight off the snapshot, bypassing access control:
//! the raw version history of one asset's key, and the committed event
//! log.

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;

use dcot_ledger::create_composite_key;
use dcot_state::CUSTODY_OBJECT_TYPE;

use crate::ledger::open_ledger;

/// Arguments for `dcot history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Asset identifier.
    pub asset_id: String,
}

pub fn run_history(args: &HistoryArgs, ledger_path: &Path) -> Result<u8> {
    let ledger = open_ledger(ledger_path)?;
    let key = create_composite_key(CUSTODY_OBJECT_TYPE, &[&args.asset_id])?;
    let history = ledger.history(&key);
    if history.is_empty() {
        bail!("no history for asset {}", args.asset_id);
    }
    for modification in history {
        println!(
            "{}  {}  {}",
            modification.timestamp,
            modification.tx_id,
            String::from_utf8_lossy(&modification.value)
        );
    }
    Ok(0)
}

pub fn run_events(ledger_path: &Path) -> Result<u8> {
    let ledger = open_ledger(ledger_path)?;
    let events = ledger.events();
    if events.is_empty() {
        println!("No events.");
    }
    for event in events {
        println!(
            "#{}  {}  {}  {}",
            event.block,
            event.tx_id,
            event.name,
            String::from_utf8_lossy(&event.payload)
        );
    }
    Ok(0)
}
