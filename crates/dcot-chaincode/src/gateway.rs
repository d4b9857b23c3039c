//! # Transaction Gateway
//!
//! Runs an invocation as one ledger transaction. `submit` commits only
//! successful invocations, so a failed transition never leaves a write
//! behind; `evaluate` never commits.

use std::sync::Arc;

use dcot_core::CustodyError;
use dcot_ledger::{ClientIdentity, InMemoryLedger};

use crate::dispatcher::Dispatcher;
use crate::response::Response;

/// Submits and evaluates invocations against a shared ledger.
#[derive(Debug, Clone)]
pub struct Gateway {
    ledger: Arc<InMemoryLedger>,
    dispatcher: Dispatcher,
}

impl Gateway {
    pub fn new(ledger: Arc<InMemoryLedger>, dispatcher: Dispatcher) -> Self {
        Self { ledger, dispatcher }
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Invoke and commit on success.
    ///
    /// A commit rejected by MVCC validation becomes a failure response
    /// marked retryable.
    pub fn submit(
        &self,
        identity: impl ClientIdentity + 'static,
        function: &str,
        args: &[String],
    ) -> Response {
        let mut tx = self.ledger.begin(identity);
        let response = self.dispatcher.invoke(&mut tx, function, args);
        if !response.is_success() {
            return response;
        }
        match self.ledger.commit(tx) {
            Ok(receipt) => {
                tracing::debug!(
                    tx_id = %receipt.tx_id,
                    block = receipt.block,
                    function,
                    "submitted"
                );
                response
            }
            Err(err) => {
                let err = CustodyError::from(err);
                tracing::warn!(function, error = %err, "commit rejected");
                Response::from_error(function, &err)
            }
        }
    }

    /// Invoke without committing.
    pub fn evaluate(
        &self,
        identity: impl ClientIdentity + 'static,
        function: &str,
        args: &[String],
    ) -> Response {
        let mut tx = self.ledger.begin(identity);
        self.dispatcher.invoke(&mut tx, function, args)
    }
}
