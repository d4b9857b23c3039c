//! # Invoke and Query Subcommands
//!
//! Both take the caller's role and unique id, the operation name and its
//! arguments. `invoke` submits and persists the ledger on success;
//! `query` evaluates and never writes.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use dcot_chaincode::{ChaincodeConfig, Dispatcher, Gateway, Response};
use dcot_core::CustodyError;
use dcot_ledger::StaticIdentity;

use crate::ledger::SnapshotSession;

/// Arguments shared by `dcot invoke` and `dcot query`.
#[derive(Args, Debug, Clone)]
pub struct InvokeArgs {
    /// Role attribute of the caller. Omit to invoke without a role.
    #[arg(long)]
    pub role: Option<String>,

    /// Unique id attribute of the caller.
    #[arg(long)]
    pub uid: String,

    /// Print the full response as JSON.
    #[arg(long)]
    pub json: bool,

    /// Operation name (e.g. initNewChain, startTransfer).
    pub operation: String,

    /// Operation arguments.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl InvokeArgs {
    /// The caller credential, using the configured attribute names.
    pub fn identity(&self, config: &ChaincodeConfig) -> StaticIdentity {
        let identity =
            StaticIdentity::new(&self.uid).with_attribute(&config.uid_attribute, &self.uid);
        match &self.role {
            Some(role) => identity.with_attribute(&config.role_attribute, role),
            None => identity,
        }
    }
}

/// Submit (`commit = true`) or evaluate a transaction.
///
/// Returns exit code 0 on success and 1 when the chaincode rejects the
/// invocation or the snapshot cannot be written back.
pub fn run_invoke(
    args: &InvokeArgs,
    config: &ChaincodeConfig,
    ledger_path: &Path,
    commit: bool,
) -> Result<u8> {
    let session = SnapshotSession::open(ledger_path)?;
    let response = execute(args, config, &session, commit);
    print_response(&response, args.json)?;
    Ok(if response.is_success() { 0 } else { 1 })
}

/// Run the invocation against the session's ledger. A successful submit
/// only reports success once the snapshot has been saved.
pub fn execute(
    args: &InvokeArgs,
    config: &ChaincodeConfig,
    session: &SnapshotSession,
    commit: bool,
) -> Response {
    let gateway = Gateway::new(session.ledger(), Dispatcher::from_config(config));
    let identity = args.identity(config);
    if !commit {
        return gateway.evaluate(identity, &args.operation, &args.args);
    }

    let response = gateway.submit(identity, &args.operation, &args.args);
    if !response.is_success() {
        return response;
    }
    match session.save() {
        Ok(()) => response,
        Err(err) => {
            let err = CustodyError::from(err);
            tracing::warn!(operation = %args.operation, error = %err, "snapshot not saved");
            Response::from_error(&args.operation, &err)
        }
    }
}

fn print_response(response: &Response, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(response)?);
        return Ok(());
    }
    match response {
        Response::Success { payload: Some(payload) } => println!("{payload}"),
        Response::Success { payload: None } => println!("OK"),
        Response::Failure { message } => eprintln!("Error: {message}"),
    }
    Ok(())
}
