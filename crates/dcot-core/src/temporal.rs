//! # Timestamps
//!
//! Event moments and ledger commit times share one representation: a UTC
//! instant with whole-second precision, rendered as `YYYY-MM-DDTHH:MM:SSZ`.
//! Inputs with an explicit offset are refused rather than converted.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CustodyError;

const MOMENT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A whole-second UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(0))
    }

    /// Parse an RFC 3339 moment ending in `Z`. Fractional seconds are dropped.
    pub fn parse(s: &str) -> Result<Self, CustodyError> {
        if !s.ends_with('Z') {
            return Err(CustodyError::Validation(format!(
                "moment {s:?} is not expressed in UTC (expected a Z suffix)"
            )));
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc).trunc_subsecs(0)))
            .map_err(|e| CustodyError::Validation(format!("moment {s:?}: {e}")))
    }

    pub fn from_epoch_secs(secs: i64) -> Result<Self, CustodyError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| CustodyError::Validation(format!("epoch seconds {secs} out of range")))
    }

    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn to_iso8601(&self) -> String {
        self.0.format(MOMENT_FORMAT).to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(MOMENT_FORMAT))
    }
}
