//! Dispatch counters carried through a run and into the shutdown report.

use serde::{Deserialize, Serialize};

/// Running totals kept by the dispatcher.
///
/// `pushed == done + dead_lettered + queued + in_flight` holds at every
/// instant; retries move a unit back to the queue without touching `pushed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Units added to the queue by scans.
    pub pushed: u64,
    /// Descriptors written to workers, retries included.
    pub dispatched: u64,
    /// Units reported `done`.
    pub done: u64,
    /// Units pushed back to the tail after a failed relocation or lost worker.
    pub requeued: u64,
    /// Units dropped after exhausting `max_attempts`.
    pub dead_lettered: u64,
    /// Workers retired because their channel closed.
    pub retired_workers: u64,
}
