//! Scan error policy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a scan pass reacts to a malformed candidate-data entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPolicy {
    /// Fail the whole pass; the daemon shuts down with exit code 1.
    #[default]
    Abort,
    /// Log the entry and leave it in the intake directory.
    Skip,
}

impl fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Skip => write!(f, "skip"),
        }
    }
}
