//! # dcot-chaincode — Invocation Surface
//!
//! Everything between a transaction proposal and the custody state machine:
//!
//! - [`Dispatcher`] resolves the caller once, looks the operation up by
//!   name and runs it, turning every outcome into a [`Response`].
//! - [`Gateway`] wraps a dispatch in an [`InMemoryLedger`](dcot_ledger::InMemoryLedger)
//!   transaction and commits it only on success.
//! - [`ChaincodeConfig`] selects the role exclusion policy and the
//!   credential attribute names.

pub mod config;
pub mod dispatcher;
pub mod gateway;
pub mod response;

pub use config::{ChaincodeConfig, ConfigError};
pub use dispatcher::Dispatcher;
pub use gateway::Gateway;
pub use response::Response;
