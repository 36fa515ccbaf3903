//! Outcome tokens reported by a worker after each relocation.

use std::fmt;
use std::str::FromStr;

use super::job::{DescriptorError, JobUnit};

/// Literal token for a successful relocation.
pub const DONE_TOKEN: &str = "done";

/// What a worker reports back for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The unit's files were relocated.
    Done,
    /// Relocation failed; the unit should be queued again.
    Retry(JobUnit),
}

impl fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => f.write_str(DONE_TOKEN),
            Self::Retry(unit) => write!(f, "{unit}"),
        }
    }
}

impl FromStr for WorkerOutcome {
    type Err = DescriptorError;

    /// Anything other than `done` is read as the descriptor to retry.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token == DONE_TOKEN {
            Ok(Self::Done)
        } else {
            token.parse().map(Self::Retry)
        }
    }
}
