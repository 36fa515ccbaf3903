//! Dispatcher: scans on trigger, hands units to ready workers, collects
//! outcomes, and re-queues failures until the queue drains.
//!
//! Each round first assigns one unit to every ready worker, then waits for
//! the outcome of every worker assigned in that round. A round therefore has
//! at most one unit in flight per worker.

use std::collections::HashMap;

use tokio::sync::watch;
use tracing;

use filebot_core::error::AppError;
use filebot_core::result::AppResult;
use filebot_core::types::{DispatchStats, JobUnit, WorkerOutcome};

use crate::pool::{TeardownReport, WorkerPool};
use crate::queue::WorkQueue;
use crate::scanner::Scanner;
use crate::trigger::TriggerListener;

/// Where the dispatcher is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Waiting for a trigger.
    Idle,
    /// Assigning and collecting until the queue is empty.
    Draining,
    /// Terminal; the pool is being or has been torn down.
    ShuttingDown,
}

/// Final state of a run, handed to the report.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Counters at shutdown.
    pub stats: DispatchStats,
    /// Units dropped after exhausting their attempts.
    pub dead_letters: Vec<JobUnit>,
    /// Units still queued when shutdown arrived.
    pub abandoned: Vec<JobUnit>,
    /// How each worker stopped.
    pub teardown: TeardownReport,
}

/// Single owner of the work queue and the dispatcher side of every worker.
#[derive(Debug)]
pub struct Dispatcher {
    queue: WorkQueue,
    pool: WorkerPool,
    scanner: Scanner,
    /// Unit currently held by each worker, indexed by worker id.
    in_flight: Vec<Option<JobUnit>>,
    attempts: HashMap<JobUnit, u32>,
    max_attempts: Option<u32>,
    dead_letters: Vec<JobUnit>,
    stats: DispatchStats,
    state: DispatcherState,
}

impl Dispatcher {
    /// Create a dispatcher over a spawned pool.
    ///
    /// `max_attempts` of `None` retries failed units without limit.
    pub fn new(pool: WorkerPool, scanner: Scanner, max_attempts: Option<u32>) -> Self {
        let in_flight = vec![None; pool.len()];
        Self {
            queue: WorkQueue::new(),
            pool,
            scanner,
            in_flight,
            attempts: HashMap::new(),
            max_attempts,
            dead_letters: Vec::new(),
            stats: DispatchStats::default(),
            state: DispatcherState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// The pending queue.
    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Units dropped after exhausting their attempts.
    pub fn dead_letters(&self) -> &[JobUnit] {
        &self.dead_letters
    }

    /// Number of units sent to a worker and not yet reported.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.iter().filter(|u| u.is_some()).count()
    }

    /// Append units at the tail of the queue.
    pub fn enqueue(&mut self, units: impl IntoIterator<Item = JobUnit>) {
        for unit in units {
            self.queue.push(unit);
            self.stats.pushed += 1;
        }
    }

    /// Scan the intake directory and queue everything found.
    ///
    /// The queue is untouched when the scan fails.
    pub async fn rescan(&mut self) -> AppResult<usize> {
        let units = self.scanner.scan().await?;
        let found = units.len();
        self.enqueue(units);
        tracing::info!(found, queued = self.queue.size(), "Intake scanned");
        Ok(found)
    }

    /// Run rounds until the queue is empty or shutdown is requested.
    ///
    /// Shutdown is checked between rounds; a round in progress always
    /// completes. Units still queued then are left for the caller.
    pub async fn drain(&mut self, shutdown: &watch::Receiver<bool>) -> AppResult<()> {
        self.state = DispatcherState::Draining;
        while !self.queue.is_empty() {
            if *shutdown.borrow() {
                tracing::info!(
                    remaining = self.queue.size(),
                    "Shutdown requested, stopping after current round"
                );
                break;
            }
            self.dispatch_round().await?;
        }
        self.state = DispatcherState::Idle;
        Ok(())
    }

    /// One assign-then-collect round. Returns how many units were assigned.
    ///
    /// A worker whose channel is closed is retired and the unit it held goes
    /// back to the tail of the queue. Fails when units remain but no worker
    /// is left to take them.
    pub async fn dispatch_round(&mut self) -> AppResult<usize> {
        let mut assigned = Vec::new();

        for id in 0..self.pool.len() {
            if !self.pool.is_ready(id) {
                continue;
            }
            let Some(end) = self.pool.channel(id) else {
                continue;
            };
            let Some(unit) = self.queue.pop_front() else {
                break;
            };

            match end.send(&unit).await {
                Ok(()) => {
                    tracing::debug!(worker = id, unit = %unit, "Assigned");
                    self.pool.set_ready(id, false);
                    *self.attempts.entry(unit.clone()).or_insert(0) += 1;
                    self.stats.dispatched += 1;
                    self.in_flight[id] = Some(unit);
                    assigned.push(id);
                }
                Err(e) => {
                    tracing::error!(worker = id, unit = %unit, "Send failed: {}", e);
                    self.retire(id);
                    self.requeue(unit);
                }
            }
        }

        for &id in &assigned {
            let Some(end) = self.pool.channel_mut(id) else {
                continue;
            };
            let received = end.recv().await;
            let Some(unit) = self.in_flight[id].take() else {
                continue;
            };

            match received {
                Ok(token) => {
                    self.pool.set_ready(id, true);
                    self.handle_outcome(id, &token, unit);
                }
                Err(e) => {
                    tracing::error!(worker = id, unit = %unit, "Receive failed: {}", e);
                    self.retire(id);
                    self.requeue(unit);
                }
            }
        }

        if self.pool.live_count() == 0 && !self.queue.is_empty() {
            return Err(AppError::channel(format!(
                "No live workers left with {} units queued",
                self.queue.size()
            )));
        }
        Ok(assigned.len())
    }

    /// React to one worker's outcome token for `unit`.
    fn handle_outcome(&mut self, id: usize, token: &str, unit: JobUnit) {
        match token.parse::<WorkerOutcome>() {
            Ok(WorkerOutcome::Done) => {
                tracing::info!(worker = id, unit = %unit, "Relocated");
                self.attempts.remove(&unit);
                self.stats.done += 1;
            }
            Ok(WorkerOutcome::Retry(reported)) => {
                if reported != unit {
                    tracing::warn!(
                        worker = id,
                        expected = %unit,
                        reported = %reported,
                        "Worker reported a different unit, retrying the one it held"
                    );
                }
                self.retry(unit);
            }
            Err(e) => {
                tracing::warn!(worker = id, token, "Unrecognized outcome: {}", e);
                self.retry(unit);
            }
        }
    }

    fn retry(&mut self, unit: JobUnit) {
        let attempts = self.attempts.get(&unit).copied().unwrap_or(0);
        match self.max_attempts {
            Some(max) if attempts >= max => {
                tracing::error!(unit = %unit, attempts, "Giving up on unit");
                self.attempts.remove(&unit);
                self.stats.dead_lettered += 1;
                self.dead_letters.push(unit);
            }
            _ => {
                tracing::info!(unit = %unit, attempts, "Re-queueing unit");
                self.requeue(unit);
            }
        }
    }

    fn requeue(&mut self, unit: JobUnit) {
        self.queue.push(unit);
        self.stats.requeued += 1;
    }

    fn retire(&mut self, id: usize) {
        if !self.pool.is_retired(id) {
            self.pool.retire(id);
            self.stats.retired_workers += 1;
        }
    }

    /// Serve triggers until shutdown, then tear the pool down.
    ///
    /// Teardown runs on both the graceful and the error path.
    pub async fn run(
        mut self,
        mut triggers: TriggerListener,
        mut shutdown: watch::Receiver<bool>,
        scan_on_start: bool,
    ) -> AppResult<RunSummary> {
        let result = self
            .event_loop(&mut triggers, &mut shutdown, scan_on_start)
            .await;

        self.state = DispatcherState::ShuttingDown;
        let abandoned: Vec<JobUnit> = std::iter::from_fn(|| self.queue.pop_front()).collect();
        if !abandoned.is_empty() {
            tracing::warn!(count = abandoned.len(), "Abandoning queued units");
        }

        let Self {
            pool,
            stats,
            dead_letters,
            ..
        } = self;
        let teardown = pool.teardown().await;

        result.map(|()| RunSummary {
            stats,
            dead_letters,
            abandoned,
            teardown,
        })
    }

    async fn event_loop(
        &mut self,
        triggers: &mut TriggerListener,
        shutdown: &mut watch::Receiver<bool>,
        scan_on_start: bool,
    ) -> AppResult<()> {
        if scan_on_start {
            self.rescan().await?;
            self.drain(shutdown).await?;
        }

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
                trigger = triggers.wait() => match trigger {
                    Some(trigger) => {
                        tracing::debug!(hint = ?trigger.hint, "Rescan triggered");
                        self.rescan().await?;
                        self.drain(shutdown).await?;
                    }
                    None => {
                        tracing::debug!("Trigger source closed, waiting for shutdown");
                        let _ = shutdown.wait_for(|stop| *stop).await;
                        return Ok(());
                    }
                },
            }
        }
    }
}
