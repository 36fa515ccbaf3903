//! Filebot daemon
//!
//! Usage: `filebot [CONFIG]`. Watches the intake directory and files every
//! candidate's documents under `output_dir/<job_ref>/Application_<n>/`.

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use filebot_core::config::{FilebotConfig, LoggingConfig};
use filebot_core::error::AppError;

/// Config file used when none is given on the command line.
const DEFAULT_CONFIG: &str = "filebot.conf";

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = filebot_worker::service::run(config).await {
        tracing::error!("Filebot error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from the file named by the first argument
fn load_configuration() -> Result<FilebotConfig, AppError> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    if args.next().is_some() {
        return Err(AppError::configuration("Usage: filebot [CONFIG]"));
    }

    FilebotConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
