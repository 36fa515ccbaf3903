//! Start the daemon.

use filebot_core::error::AppError;

/// Execute the run command
pub async fn execute(config_path: &str) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;

    println!("Starting Filebot...");
    println!("  Watching: {}", config.input_dir.display());
    println!("  Output:   {}", config.output_dir.display());
    println!("  Workers:  {}", config.num_workers);

    let summary = filebot_worker::service::run(config).await?;

    println!(
        "Stopped: {} relocated, {} retried, {} given up, {} left queued",
        summary.stats.done,
        summary.stats.requeued,
        summary.stats.dead_lettered,
        summary.abandoned.len()
    );
    Ok(())
}
