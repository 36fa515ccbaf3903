//! Application configuration schema and loader.
//!
//! The configuration is a single file named on the command line. The four
//! keys `input_dir`, `output_dir`, `num_workers` and `interval_ms` are
//! mandatory; every other key is optional. Unknown keys are rejected.

pub mod logging;
pub mod policy;

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::FileFormat;
use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::policy::ScanPolicy;

use crate::error::AppError;
use crate::result::AppResult;

/// Prefix for environment variable overrides, e.g. `FILEBOT__NUM_WORKERS`.
pub const ENV_PREFIX: &str = "FILEBOT";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilebotConfig {
    /// Intake directory watched for new application files.
    pub input_dir: PathBuf,
    /// Root of the structured output tree.
    pub output_dir: PathBuf,
    /// Number of relocation workers in the pool.
    pub num_workers: usize,
    /// Monitor throttle between forwarded change batches, in milliseconds.
    pub interval_ms: u64,
    /// Maximum relocation attempts per job unit. Absent means retry forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// What a malformed candidate-data entry does to a scan pass.
    #[serde(default)]
    pub scan_policy: ScanPolicy,
    /// Scan the intake directory once at startup, before any trigger.
    #[serde(default = "default_true")]
    pub scan_on_start: bool,
    /// How long teardown waits for a worker to exit before aborting it.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
    /// Where the shutdown report is written.
    #[serde(default = "default_report_file")]
    pub report_file: PathBuf,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FilebotConfig {
    /// Load configuration from a file plus `FILEBOT__*` environment overrides.
    ///
    /// The file format follows the extension: `.toml`, `.json`, and anything
    /// else is read as flat `key = value` lines.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(format_for(path))
                    .required(true),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to read config '{}': {e}",
                    path.display()
                ))
            })?;

        let parsed: Self = config.try_deserialize().map_err(|e| {
            AppError::configuration(format!(
                "Invalid config '{}': {e}",
                path.display()
            ))
        })?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(AppError::configuration("input_dir must not be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(AppError::configuration("output_dir must not be empty"));
        }
        if self.num_workers == 0 {
            return Err(AppError::configuration("num_workers must be > 0"));
        }
        if self.interval_ms == 0 {
            return Err(AppError::configuration("interval_ms must be > 0"));
        }
        if self.max_attempts == Some(0) {
            return Err(AppError::configuration("max_attempts must be >= 1"));
        }
        Ok(())
    }

    /// Monitor throttle interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Teardown grace period per worker.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn format_for(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => FileFormat::Toml,
        Some("json") => FileFormat::Json,
        _ => FileFormat::Ini,
    }
}

fn default_true() -> bool {
    true
}

fn default_shutdown_grace() -> u64 {
    5000
}

fn default_report_file() -> PathBuf {
    PathBuf::from("report.txt")
}
