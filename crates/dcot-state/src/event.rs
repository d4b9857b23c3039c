//! # Audit Events
//!
//! Every successful mutation attaches a fresh [`Event`] to the record it
//! writes. The moment comes from a [`Clock`], which is the wall clock in
//! production and a fixed instant in tests.

use std::sync::Arc;

use dcot_core::{CustodyError, Event, Timestamp};

/// Source of event timestamps.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Builds audit events.
#[derive(Debug, Clone)]
pub struct EventRecorder {
    clock: Arc<dyn Clock>,
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl EventRecorder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Create the event for a transition performed by `caller` acting as
    /// `role`.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::Validation`] if any input is empty.
    pub fn create_event(
        &self,
        caller: &str,
        role: &str,
        operation: &str,
    ) -> Result<Event, CustodyError> {
        for (field, value) in [("caller", caller), ("role", role), ("operation", operation)] {
            if value.is_empty() {
                return Err(CustodyError::Validation(format!(
                    "cannot record event: {field} is empty"
                )));
            }
        }
        Ok(Event {
            caller: caller.to_string(),
            role: role.to_string(),
            operation: operation.to_string(),
            moment: self.clock.now().to_iso8601(),
        })
    }
}
