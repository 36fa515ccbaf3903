//! Fixed pool of relocation workers and its teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing;

use filebot_core::error::AppError;
use filebot_core::result::AppResult;
use filebot_core::traits::Relocator;

use crate::channel::{DispatcherEnd, WorkerEnd, worker_channel};
use crate::monitor::Monitor;
use crate::runner::WorkerLoop;

/// Default time each worker gets to exit during teardown.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// What happened to each worker during teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Workers that exited within the grace period.
    pub joined: Vec<usize>,
    /// Workers force-stopped after the grace period.
    pub aborted: Vec<usize>,
    /// Workers whose task panicked.
    pub failed: Vec<usize>,
}

/// Dispatcher-side record of one worker.
#[derive(Debug)]
struct Worker {
    end: DispatcherEnd,
    /// Worker-side ends, held until the task is spawned.
    peer: Option<WorkerEnd>,
    ready: bool,
    retired: bool,
    handle: Option<JoinHandle<()>>,
}

/// Fixed-size set of workers, each with a private channel pair.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Worker>,
    monitor: Option<Monitor>,
    shutdown_tx: watch::Sender<bool>,
    grace: Duration,
}

impl WorkerPool {
    /// Create `size` workers with open channels, all marked ready.
    pub fn create(size: usize) -> AppResult<Self> {
        if size == 0 {
            return Err(AppError::configuration("Worker pool size must be at least 1"));
        }

        let workers = (0..size)
            .map(|id| {
                let (end, peer) = worker_channel(id);
                Worker {
                    end,
                    peer: Some(peer),
                    ready: true,
                    retired: false,
                    handle: None,
                }
            })
            .collect();
        let (shutdown_tx, _) = watch::channel(false);

        tracing::debug!(size, "Worker pool created");
        Ok(Self {
            workers,
            monitor: None,
            shutdown_tx,
            grace: DEFAULT_GRACE,
        })
    }

    /// Set how long teardown waits for each worker.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Start one task per worker, all sharing `relocator`.
    pub fn spawn_workers(&mut self, relocator: Arc<dyn Relocator>) -> AppResult<()> {
        for (id, worker) in self.workers.iter_mut().enumerate() {
            let peer = worker
                .peer
                .take()
                .ok_or_else(|| AppError::internal(format!("Worker {id} already started")))?;
            let runner = WorkerLoop::new(peer, relocator.clone(), self.shutdown_tx.subscribe());
            worker.handle = Some(tokio::spawn(runner.run()));
        }
        tracing::info!(workers = self.workers.len(), "Workers started");
        Ok(())
    }

    /// Hand the monitor to the pool so teardown stops it last.
    pub fn attach_monitor(&mut self, monitor: Monitor) {
        self.monitor = Some(monitor);
    }

    /// Number of workers, retired ones included.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Always false; a pool has at least one worker.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Whether worker `id` may receive a descriptor.
    pub fn is_ready(&self, id: usize) -> bool {
        self.workers
            .get(id)
            .is_some_and(|w| w.ready && !w.retired)
    }

    /// Mark worker `id` ready or busy.
    pub fn set_ready(&mut self, id: usize, ready: bool) {
        if let Some(worker) = self.workers.get_mut(id) {
            worker.ready = ready;
        }
    }

    /// Whether worker `id` was taken out of rotation.
    pub fn is_retired(&self, id: usize) -> bool {
        self.workers.get(id).is_none_or(|w| w.retired)
    }

    /// Take worker `id` out of rotation for good.
    pub fn retire(&mut self, id: usize) {
        if let Some(worker) = self.workers.get_mut(id) {
            if !worker.retired {
                tracing::warn!(worker = id, "Retiring worker");
            }
            worker.retired = true;
            worker.ready = false;
        }
    }

    /// Number of workers still in rotation.
    pub fn live_count(&self) -> usize {
        self.workers.iter().filter(|w| !w.retired).count()
    }

    /// Dispatcher end of worker `id`.
    pub fn channel(&self, id: usize) -> Option<&DispatcherEnd> {
        self.workers.get(id).map(|w| &w.end)
    }

    /// Mutable dispatcher end of worker `id`, for receiving.
    pub fn channel_mut(&mut self, id: usize) -> Option<&mut DispatcherEnd> {
        self.workers.get_mut(id).map(|w| &mut w.end)
    }

    /// Stop worker `id`'s task so its channel ends close.
    #[cfg(test)]
    pub(crate) async fn kill_worker(&mut self, id: usize) {
        if let Some(handle) = self.workers.get_mut(id).and_then(|w| w.handle.take()) {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Stop every worker, then the monitor.
    ///
    /// Workers are signalled, their channel ends are closed, and each is
    /// awaited in id order for up to the grace period before being aborted.
    /// Consuming the pool makes a second teardown impossible.
    pub async fn teardown(self) -> TeardownReport {
        let Self {
            workers,
            monitor,
            shutdown_tx,
            grace,
        } = self;
        let mut report = TeardownReport::default();

        shutdown_tx.send_replace(true);

        for (id, worker) in workers.into_iter().enumerate() {
            let Worker { end, handle, .. } = worker;
            drop(end);
            let Some(mut handle) = handle else {
                continue;
            };

            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => report.joined.push(id),
                Ok(Err(e)) => {
                    tracing::error!(worker = id, "Worker task failed: {}", e);
                    report.failed.push(id);
                }
                Err(_) => {
                    tracing::warn!(worker = id, "Worker did not stop within {:?}, aborting", grace);
                    handle.abort();
                    let _ = handle.await;
                    report.aborted.push(id);
                }
            }
        }

        if let Some(monitor) = monitor {
            monitor.stop().await;
        }

        tracing::info!(
            joined = report.joined.len(),
            aborted = report.aborted.len(),
            failed = report.failed.len(),
            "Worker pool torn down"
        );
        report
    }
}
