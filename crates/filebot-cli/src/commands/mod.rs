//! CLI command definitions and dispatch.

pub mod config;
pub mod report;
pub mod run;
pub mod scan;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use filebot_core::config::FilebotConfig;
use filebot_core::error::AppError;

/// Filebot: files incoming application documents by job reference
#[derive(Debug, Parser)]
#[command(name = "filebot-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the daemon in the foreground
    Run,
    /// List the job units a scan would queue, without moving anything
    Scan,
    /// Configuration inspection
    Config(config::ConfigArgs),
    /// Write the output-tree report
    Report(report::ReportArgs),
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> String {
        match self.command {
            Commands::Run => load_config(&self.config)
                .map(|c| c.logging.level)
                .unwrap_or_else(|_| "info".to_string()),
            _ => "warn".to_string(),
        }
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Run => run::execute(&self.config).await,
            Commands::Scan => scan::execute(&self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
            Commands::Report(args) => report::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<FilebotConfig, AppError> {
    FilebotConfig::load(config_path)
}
