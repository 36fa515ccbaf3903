//! Intake directory monitor.
//!
//! Watches the intake directory with `notify` and raises a rescan trigger
//! whenever files are created in (or moved into) it. After each forwarded
//! batch the monitor sleeps for the configured interval.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use filebot_core::error::{AppError, ErrorKind};
use filebot_core::result::AppResult;

use crate::trigger::TriggerHandle;

/// Running directory monitor.
#[derive(Debug)]
pub struct Monitor {
    watcher: RecommendedWatcher,
    task: JoinHandle<()>,
    path: PathBuf,
}

impl Monitor {
    /// Start watching `input_dir`, firing `trigger` on new files.
    pub fn start(input_dir: &Path, interval: Duration, trigger: TriggerHandle) -> AppResult<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = event_tx.send(event);
                }
                Err(e) => error!("Watch error: {:?}", e),
            },
            Config::default(),
        )
        .map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to create watcher", e)
        })?;

        watcher
            .watch(input_dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to watch {}", input_dir.display()),
                    e,
                )
            })?;

        let task = tokio::spawn(forward_events(event_rx, interval, trigger));
        info!(path = %input_dir.display(), "Monitoring directory for new files");

        Ok(Self {
            watcher,
            task,
            path: input_dir.to_path_buf(),
        })
    }

    /// Stop watching and wait for the forwarding task to end.
    pub async fn stop(self) {
        let Self {
            mut watcher,
            task,
            path,
        } = self;
        if let Err(e) = watcher.unwatch(&path) {
            debug!("Unwatch failed for {}: {}", path.display(), e);
        }
        drop(watcher);

        task.abort();
        match task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => error!("Monitor task failed: {}", e),
        }
        info!(path = %path.display(), "Monitor stopped");
    }
}

/// Whether an event means a file arrived in the watched directory.
pub fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

async fn forward_events(
    mut events: mpsc::UnboundedReceiver<Event>,
    interval: Duration,
    trigger: TriggerHandle,
) {
    while let Some(event) = events.recv().await {
        let mut hint = arrival_path(&event);
        while let Ok(more) = events.try_recv() {
            if hint.is_none() {
                hint = arrival_path(&more);
            }
        }

        if let Some(path) = hint {
            debug!(path = %path.display(), "New files detected");
            trigger.fire(Some(path));
            tokio::time::sleep(interval).await;
        }
    }
    debug!("Watcher event channel closed");
}

fn arrival_path(event: &Event) -> Option<PathBuf> {
    if is_arrival(&event.kind) {
        event.paths.first().cloned()
    } else {
        None
    }
}
