//! Shared helpers for worker integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use filebot_core::config::FilebotConfig;
use filebot_core::error::AppError;
use filebot_core::result::AppResult;
use filebot_core::traits::{RelocationSummary, Relocator};
use filebot_core::types::JobUnit;

/// Scratch intake/output directories plus a config pointing at them
pub struct TestEnv {
    /// Keeps the scratch tree alive
    pub dir: TempDir,
    /// Intake directory
    pub input: PathBuf,
    /// Output root
    pub output: PathBuf,
}

impl TestEnv {
    /// Create empty intake and output directories
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&input).expect("Failed to create intake dir");
        Self { dir, input, output }
    }

    /// Drop a file into the intake directory
    pub fn intake(&self, name: &str, contents: &str) {
        std::fs::write(self.input.join(name), contents).expect("Failed to write intake file");
    }

    /// Write a file outside the intake directory, then move it in whole
    pub fn drop_in(&self, name: &str, contents: &str) {
        let staged = self.dir.path().join(name);
        std::fs::write(&staged, contents).expect("Failed to stage file");
        std::fs::rename(&staged, self.input.join(name)).expect("Failed to move file into intake");
    }

    /// Path under the scratch root
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a TOML config with `extra` appended and load it
    pub fn config(&self, num_workers: usize, extra: &str) -> FilebotConfig {
        let body = format!(
            "input_dir = {:?}\noutput_dir = {:?}\nnum_workers = {}\ninterval_ms = 10\nshutdown_grace_ms = 500\nreport_file = {:?}\n{}",
            self.input,
            self.output,
            num_workers,
            self.path("report.txt"),
            extra
        );
        let path = self.path("filebot.toml");
        std::fs::write(&path, body).expect("Failed to write config");
        FilebotConfig::load(&path).expect("Failed to load test config")
    }
}

/// Poll until `path` exists or the timeout passes
pub async fn wait_for(path: &Path, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    path.exists()
}

/// Relocator that records start/end events and can fail chosen units
#[derive(Debug, Default)]
pub struct RecordingRelocator {
    /// `start N` / `end N` in the order they happened
    pub events: Mutex<Vec<String>>,
    /// Remaining forced failures per application number
    pub failures: Mutex<Vec<(u32, u32)>>,
    /// Delay inside each relocation
    pub delay: Duration,
}

impl RecordingRelocator {
    /// Fail unit `app_num` the next `times` relocations
    pub fn fail(self, app_num: u32, times: u32) -> Self {
        self.failures.lock().unwrap().push((app_num, times));
        self
    }

    /// Sleep `delay` inside every relocation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Application numbers in the order relocation started
    pub fn started(&self) -> Vec<u32> {
        self.events()
            .iter()
            .filter_map(|e| e.strip_prefix("start "))
            .filter_map(|n| n.parse().ok())
            .collect()
    }

    fn take_failure(&self, app_num: u32) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.iter_mut().find(|(n, left)| *n == app_num && *left > 0) {
            Some((_, left)) => {
                *left -= 1;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Relocator for RecordingRelocator {
    fn backend(&self) -> &str {
        "recording"
    }

    async fn relocate(&self, unit: &JobUnit) -> AppResult<RelocationSummary> {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {}", unit.app_num));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let failed = self.take_failure(unit.app_num);
        self.events
            .lock()
            .unwrap()
            .push(format!("end {}", unit.app_num));

        if failed {
            return Err(AppError::storage(format!("simulated failure for {unit}")));
        }
        Ok(RelocationSummary::default())
    }
}
