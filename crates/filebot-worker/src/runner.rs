//! Worker loop: reads descriptors, relocates, reports an outcome per descriptor.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;

use filebot_core::traits::Relocator;
use filebot_core::types::{JobUnit, WorkerOutcome};

use crate::channel::WorkerEnd;

/// One relocation worker bound to its channel pair
#[derive(Debug)]
pub struct WorkerLoop {
    /// Channel ends owned by this worker
    end: WorkerEnd,
    /// Backend that moves files
    relocator: Arc<dyn Relocator>,
    /// Shutdown signal from the pool
    shutdown: watch::Receiver<bool>,
}

impl WorkerLoop {
    /// Create a new worker loop
    pub fn new(end: WorkerEnd, relocator: Arc<dyn Relocator>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            end,
            relocator,
            shutdown,
        }
    }

    /// Run until shutdown is signalled or the dispatcher closes the channel
    pub async fn run(mut self) {
        let id = self.end.worker_id();
        tracing::debug!(
            worker = id,
            backend = self.relocator.backend(),
            "Worker started"
        );

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let token = tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                token = self.end.recv() => match token {
                    Some(token) => token,
                    None => break,
                },
            };

            let outcome = self.handle(&token).await;
            let Some(outcome) = outcome else {
                continue;
            };

            if let Err(e) = self.end.send(&outcome).await {
                tracing::debug!(worker = id, "Dropping outcome: {}", e);
                break;
            }
        }

        tracing::debug!(worker = id, "Worker stopped");
    }

    /// Relocate one descriptor; `None` when the token is not a descriptor
    async fn handle(&self, token: &str) -> Option<WorkerOutcome> {
        let id = self.end.worker_id();
        let unit: JobUnit = match token.parse() {
            Ok(unit) => unit,
            Err(e) => {
                tracing::warn!(worker = id, token, "Ignoring malformed descriptor: {}", e);
                return None;
            }
        };

        match self.relocator.relocate(&unit).await {
            Ok(summary) => {
                tracing::debug!(
                    worker = id,
                    unit = %unit,
                    files = summary.moved.len(),
                    "Relocation complete"
                );
                Some(WorkerOutcome::Done)
            }
            Err(e) => {
                tracing::warn!(worker = id, unit = %unit, "Relocation failed: {}", e);
                Some(WorkerOutcome::Retry(unit))
            }
        }
    }
}
