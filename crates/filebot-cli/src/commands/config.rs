//! Configuration inspection CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use filebot_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration, environment overrides applied
    Show,
    /// Validate the configuration file
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path)?;
            match format {
                OutputFormat::Json => output::print_json(&config),
                OutputFormat::Table => {
                    println!("Configuration '{}':", config_path);
                    output::print_kv("input_dir", &config.input_dir.display().to_string());
                    output::print_kv("output_dir", &config.output_dir.display().to_string());
                    output::print_kv("num_workers", &config.num_workers.to_string());
                    output::print_kv("interval_ms", &config.interval_ms.to_string());
                    output::print_kv(
                        "max_attempts",
                        &config
                            .max_attempts
                            .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
                    );
                    output::print_kv("scan_policy", &config.scan_policy.to_string());
                    output::print_kv("scan_on_start", &config.scan_on_start.to_string());
                    output::print_kv("shutdown_grace_ms", &config.shutdown_grace_ms.to_string());
                    output::print_kv("report_file", &config.report_file.display().to_string());
                    output::print_kv("logging.level", &config.logging.level);
                    output::print_kv("logging.format", &config.logging.format);
                }
            }
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{}' is valid", config_path));
                if !config.input_dir.is_dir() {
                    output::print_error(&format!(
                        "input_dir {} does not exist yet; the daemon will refuse to start",
                        config.input_dir.display()
                    ));
                }
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
    }

    Ok(())
}
