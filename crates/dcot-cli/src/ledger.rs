//! # Ledger Snapshot Subcommand
//!
//! `dcot init` creates an empty snapshot. Read-only subcommands open the
//! snapshot through [`open_ledger`]. `dcot invoke` works in a
//! [`SnapshotSession`], which writes the snapshot back only if no other
//! writer saved since it was opened.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use dcot_ledger::{InMemoryLedger, LedgerError};

/// Arguments for `dcot init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing snapshot.
    #[arg(long)]
    pub force: bool,
}

pub fn run_init(args: &InitArgs, ledger_path: &Path) -> Result<u8> {
    if ledger_path.exists() && !args.force {
        bail!(
            "ledger snapshot {} already exists (use --force to overwrite)",
            ledger_path.display()
        );
    }
    save_ledger(&InMemoryLedger::new(), ledger_path)?;
    println!("OK: created empty ledger at {}", ledger_path.display());
    Ok(0)
}

/// Open the snapshot at `path`, or an empty ledger if none exists yet.
pub fn open_ledger(path: &Path) -> Result<InMemoryLedger> {
    InMemoryLedger::open(path).with_context(|| format!("opening ledger {}", path.display()))
}

pub fn save_ledger(ledger: &InMemoryLedger, path: &Path) -> Result<()> {
    ledger
        .save_snapshot(path)
        .with_context(|| format!("saving ledger {}", path.display()))
}

/// A ledger loaded from a snapshot file, plus the height it was loaded at.
#[derive(Debug)]
pub struct SnapshotSession {
    path: PathBuf,
    base_height: u64,
    ledger: Arc<InMemoryLedger>,
}

impl SnapshotSession {
    pub fn open(path: &Path) -> Result<Self> {
        let ledger = open_ledger(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            base_height: ledger.height(),
            ledger: Arc::new(ledger),
        })
    }

    pub fn ledger(&self) -> Arc<InMemoryLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn base_height(&self) -> u64 {
        self.base_height
    }

    /// Write the session's ledger back to its snapshot file.
    ///
    /// # Errors
    ///
    /// A retryable [`LedgerError`] if another writer saved the snapshot
    /// after this session opened it or is saving it right now.
    pub fn save(&self) -> Result<(), LedgerError> {
        self.ledger.save_snapshot_over(&self.path, self.base_height)
    }
}
