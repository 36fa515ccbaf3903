//! Daemon bootstrap: wires the relocator, pool, monitor, and dispatcher
//! together and writes the shutdown report.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;

use filebot_core::config::FilebotConfig;
use filebot_core::error::AppError;
use filebot_core::result::AppResult;
use filebot_core::traits::Relocator;
use filebot_storage::{LocalRelocator, generate_report};

use crate::dispatcher::{Dispatcher, RunSummary};
use crate::monitor::Monitor;
use crate::pool::WorkerPool;
use crate::scanner::Scanner;
use crate::shutdown::install_shutdown_handler;
use crate::trigger::trigger_channel;

/// Run the daemon until SIGINT/SIGTERM.
pub async fn run(config: FilebotConfig) -> AppResult<RunSummary> {
    tracing::info!("Starting Filebot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        input_dir = %config.input_dir.display(),
        output_dir = %config.output_dir.display(),
        num_workers = config.num_workers,
        interval_ms = config.interval_ms,
        max_attempts = ?config.max_attempts,
        scan_policy = %config.scan_policy,
        "Effective configuration"
    );

    if !config.input_dir.is_dir() {
        return Err(AppError::configuration(format!(
            "input_dir is not a directory: {}",
            config.input_dir.display()
        )));
    }

    let relocator = LocalRelocator::new(&config.input_dir, &config.output_dir).await?;
    let shutdown = install_shutdown_handler();

    run_with(&config, Arc::new(relocator), shutdown).await
}

/// Run the daemon with an explicit relocator and shutdown flag.
pub async fn run_with(
    config: &FilebotConfig,
    relocator: Arc<dyn Relocator>,
    shutdown: watch::Receiver<bool>,
) -> AppResult<RunSummary> {
    // ── Step 1: Worker pool ──────────────────────────────────────
    let mut pool = WorkerPool::create(config.num_workers)?.with_grace(config.shutdown_grace());
    pool.spawn_workers(relocator)?;

    // ── Step 2: Directory monitor ────────────────────────────────
    let (trigger, triggers) = trigger_channel();
    match Monitor::start(&config.input_dir, config.interval(), trigger) {
        Ok(monitor) => pool.attach_monitor(monitor),
        Err(e) => {
            pool.teardown().await;
            return Err(e);
        }
    }

    // ── Step 3: Dispatch until shutdown ──────────────────────────
    let scanner = Scanner::new(&config.input_dir, config.scan_policy);
    let dispatcher = Dispatcher::new(pool, scanner, config.max_attempts);
    let result = dispatcher
        .run(triggers, shutdown, config.scan_on_start)
        .await;

    // ── Step 4: Shutdown report ──────────────────────────────────
    let stats = result.as_ref().ok().map(|summary| summary.stats);
    if let Err(e) = generate_report(&config.output_dir, &config.report_file, stats).await {
        tracing::error!("Failed to generate report: {}", e);
    }

    match &result {
        Ok(summary) => tracing::info!(
            done = summary.stats.done,
            requeued = summary.stats.requeued,
            dead_lettered = summary.stats.dead_lettered,
            abandoned = summary.abandoned.len(),
            "Filebot stopped"
        ),
        Err(e) => tracing::error!("Filebot stopped on error: {}", e),
    }
    result
}
