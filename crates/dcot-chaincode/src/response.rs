//! # Invocation Responses
//!
//! Every invocation ends in exactly one [`Response`]. Failures carry a
//! human-readable message prefixed with the operation name; the status
//! code follows the Fabric shim (200 success, 500 error).

use serde::Serialize;

use dcot_core::CustodyError;

pub const OK: u16 = 200;
pub const ERROR: u16 = 500;

/// Outcome of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Response {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
    },
    Failure {
        message: String,
    },
}

impl Response {
    pub fn success(payload: Option<String>) -> Self {
        Self::Success { payload }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Failure response for `err` raised while running `operation`.
    pub fn from_error(operation: &str, err: &CustodyError) -> Self {
        let mut message = format!("{operation}: {err}");
        if err.is_retryable() {
            message.push_str(" (retryable)");
        }
        Self::failure(message)
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Success { .. } => OK,
            Self::Failure { .. } => ERROR,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Success { payload } => payload.as_deref(),
            Self::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message } => Some(message),
        }
    }
}
