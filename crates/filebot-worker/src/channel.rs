//! Private channel pair between the dispatcher and one worker.
//!
//! Both directions carry the text tokens of the wire format: descriptors
//! (`"<job_ref>/<app_num>"`) towards the worker, and `"done"` or the
//! descriptor to retry back to the dispatcher.

use thiserror::Error;
use tokio::sync::mpsc;

use filebot_core::error::{AppError, ErrorKind};
use filebot_core::types::{JobUnit, WorkerOutcome};

/// Buffer per direction; a worker never holds more than one descriptor.
pub const CHANNEL_CAPACITY: usize = 1;

/// Error from a closed worker channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The worker side is gone; the descriptor was not delivered.
    #[error("worker {0} is not accepting descriptors")]
    SendClosed(usize),
    /// The worker side is gone before reporting an outcome.
    #[error("worker {0} closed its outcome channel")]
    RecvClosed(usize),
}

impl From<ChannelError> for AppError {
    fn from(err: ChannelError) -> Self {
        AppError::with_source(ErrorKind::Channel, err.to_string(), err)
    }
}

/// Ends held by the dispatcher.
#[derive(Debug)]
pub struct DispatcherEnd {
    worker_id: usize,
    to_worker: mpsc::Sender<String>,
    from_worker: mpsc::Receiver<String>,
}

/// Ends held by the worker loop.
#[derive(Debug)]
pub struct WorkerEnd {
    worker_id: usize,
    from_dispatcher: mpsc::Receiver<String>,
    to_dispatcher: mpsc::Sender<String>,
}

/// Create the two one-directional conduits for worker `worker_id`.
pub fn worker_channel(worker_id: usize) -> (DispatcherEnd, WorkerEnd) {
    let (to_worker, from_dispatcher) = mpsc::channel(CHANNEL_CAPACITY);
    let (to_dispatcher, from_worker) = mpsc::channel(CHANNEL_CAPACITY);
    (
        DispatcherEnd {
            worker_id,
            to_worker,
            from_worker,
        },
        WorkerEnd {
            worker_id,
            from_dispatcher,
            to_dispatcher,
        },
    )
}

impl DispatcherEnd {
    /// Worker this end talks to.
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Write a unit's descriptor to the worker.
    pub async fn send(&self, unit: &JobUnit) -> Result<(), ChannelError> {
        self.to_worker
            .send(unit.descriptor())
            .await
            .map_err(|_| ChannelError::SendClosed(self.worker_id))
    }

    /// Wait for the worker's raw outcome token.
    pub async fn recv(&mut self) -> Result<String, ChannelError> {
        self.from_worker
            .recv()
            .await
            .ok_or(ChannelError::RecvClosed(self.worker_id))
    }
}

impl WorkerEnd {
    /// Worker this end belongs to.
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Wait for the next raw descriptor; `None` once the dispatcher closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.from_dispatcher.recv().await
    }

    /// Report the outcome of one descriptor.
    pub async fn send(&self, outcome: &WorkerOutcome) -> Result<(), ChannelError> {
        self.to_dispatcher
            .send(outcome.to_string())
            .await
            .map_err(|_| ChannelError::SendClosed(self.worker_id))
    }
}
