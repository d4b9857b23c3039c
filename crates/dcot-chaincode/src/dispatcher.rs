//! # Request Dispatcher
//!
//! The chaincode entry point. One [`Dispatcher::invoke`] call serves one
//! transaction proposal:
//!
//! 1. Resolve the caller's role and unique id from the creator credential.
//! 2. Read the attribute named by the caller's role (the operator flag).
//! 3. Look the operation up by name; unknown names fail with
//!    `invalid operation`.
//! 4. Run the transition and convert its outcome into a [`Response`].
//!
//! Each invocation runs inside an `invoke` tracing span and bumps the
//! `dcot_invocations_total` counter.

use std::collections::HashMap;

use dcot_core::{CallerIdentity, CustodyError, Operation};
use dcot_ledger::ChaincodeStub;
use dcot_state::{CustodyWorkflow, IdentityResolver};

use crate::config::ChaincodeConfig;
use crate::response::Response;

/// Counter of invocations, labelled by `operation` and `outcome`.
pub const INVOCATIONS_METRIC: &str = "dcot_invocations_total";

/// Routes invocations to custody transitions.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    resolver: IdentityResolver,
    workflow: CustodyWorkflow,
    table: HashMap<&'static str, Operation>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(IdentityResolver::default(), CustodyWorkflow::default())
    }
}

impl Dispatcher {
    pub fn new(resolver: IdentityResolver, workflow: CustodyWorkflow) -> Self {
        let table = Operation::all()
            .iter()
            .map(|op| (op.as_str(), *op))
            .collect();
        Self {
            resolver,
            workflow,
            table,
        }
    }

    pub fn from_config(config: &ChaincodeConfig) -> Self {
        Self::new(config.resolver(), config.workflow())
    }

    /// Look an operation up by its wire name.
    pub fn lookup(&self, name: &str) -> Option<Operation> {
        self.table.get(name).copied()
    }

    /// Bootstrap hook run when the chaincode is instantiated. Always
    /// succeeds.
    pub fn init(&self, args: &[String]) -> Response {
        tracing::info!(args = args.len(), "chaincode initialized");
        Response::success(None)
    }

    /// Handle one invocation of `function` with `args`.
    pub fn invoke(
        &self,
        stub: &mut dyn ChaincodeStub,
        function: &str,
        args: &[String],
    ) -> Response {
        let span = tracing::info_span!("invoke", operation = function, tx_id = stub.tx_id());
        let _guard = span.enter();

        let caller = match self.identify(stub) {
            Ok(caller) => caller,
            Err(err) => return self.fail(function, &err),
        };

        let Some(operation) = self.lookup(function) else {
            tracing::warn!(caller = caller.caller_id(), "invalid operation");
            record(function_label(None), "failure");
            return Response::failure(format!("invalid operation: {function}"));
        };

        match self.workflow.execute(operation, stub, &caller, args) {
            Ok(payload) => {
                tracing::info!(
                    caller = caller.caller_id(),
                    role = caller.role_name(),
                    "invocation succeeded"
                );
                record(function_label(Some(operation)), "success");
                Response::success(payload)
            }
            Err(err) => self.fail(function, &err),
        }
    }

    fn identify(&self, stub: &dyn ChaincodeStub) -> Result<CallerIdentity, CustodyError> {
        let creator = stub.creator();
        let caller = self.resolver.resolve(creator)?;
        let (operator_flag, _) = self
            .resolver
            .is_operator_attribute(creator, caller.role_name())?;
        tracing::debug!(
            caller = caller.caller_id(),
            role = caller.role_name(),
            operator_flag,
            "caller resolved"
        );
        Ok(caller.with_operator_flag(operator_flag))
    }

    fn fail(&self, function: &str, err: &CustodyError) -> Response {
        tracing::warn!(kind = err.kind(), error = %err, "invocation failed");
        record(function_label(self.lookup(function)), "failure");
        Response::from_error(function, err)
    }
}

/// Metric label for an operation; unknown names share one label.
fn function_label(operation: Option<Operation>) -> &'static str {
    operation.map_or("unknown", |op| op.as_str())
}

fn record(operation: &'static str, outcome: &'static str) {
    metrics::counter!(INVOCATIONS_METRIC, "operation" => operation, "outcome" => outcome)
        .increment(1);
}
