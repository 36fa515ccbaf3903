//! Dry-run scan of the intake directory.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use filebot_core::error::AppError;
use filebot_core::types::JobUnit;
use filebot_worker::Scanner;

/// One row of scan output
#[derive(Debug, Serialize, Tabled)]
pub struct ScanRow {
    /// Application number
    #[tabled(rename = "App")]
    pub app_num: u32,
    /// Job reference
    #[tabled(rename = "Job Reference")]
    pub job_ref: String,
    /// Descriptor sent to workers
    #[tabled(rename = "Descriptor")]
    pub descriptor: String,
    /// Destination relative to the output root
    #[tabled(rename = "Destination")]
    pub destination: String,
}

impl From<&JobUnit> for ScanRow {
    fn from(unit: &JobUnit) -> Self {
        Self {
            app_num: unit.app_num,
            job_ref: unit.job_ref.clone(),
            descriptor: unit.descriptor(),
            destination: format!("{}/{}", unit.job_ref, unit.application_dir()),
        }
    }
}

/// Execute the scan command
pub async fn execute(config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let scanner = Scanner::new(&config.input_dir, config.scan_policy);

    let units = scanner.scan().await?;
    let rows: Vec<ScanRow> = units.iter().map(ScanRow::from).collect();
    output::print_list(&rows, format);
    Ok(())
}
