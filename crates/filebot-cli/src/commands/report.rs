//! Output-tree report on demand.

use std::path::PathBuf;

use clap::Args;

use crate::output::{self, OutputFormat};
use filebot_core::error::AppError;

/// Arguments for the report command
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Write here instead of the configured `report_file`
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the report command
pub async fn execute(
    args: &ReportArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let path = args.output.clone().unwrap_or(config.report_file);

    let report = filebot_storage::generate_report(&config.output_dir, &path, None).await?;

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            output::print_success(&format!("Report written to '{}'", path.display()));
            output::print_kv("Directories", &report.directories.to_string());
            output::print_kv("Files", &report.files.to_string());
        }
    }
    Ok(())
}
