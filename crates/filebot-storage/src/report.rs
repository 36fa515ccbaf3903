//! Output-tree report written at shutdown.
//!
//! The report lists the output directory as an indented tree, followed by a
//! `N directories, M files` line and, when available, the dispatch totals
//! of the run that produced it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing;

use filebot_core::error::{AppError, ErrorKind};
use filebot_core::result::AppResult;
use filebot_core::types::DispatchStats;

/// A rendered report of the output tree.
#[derive(Debug, Clone, Serialize)]
pub struct OutputReport {
    /// Directory the tree was rendered from.
    pub root: PathBuf,
    /// Number of directories below the root.
    pub directories: u64,
    /// Number of files below the root.
    pub files: u64,
    /// Dispatch totals of the run, if the report was produced at shutdown.
    pub stats: Option<DispatchStats>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// The tree listing, one entry per line.
    #[serde(skip)]
    pub tree: String,
}

impl OutputReport {
    /// Render the full text body of the report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.tree);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} directories, {} files",
            self.directories, self.files
        );
        if let Some(stats) = &self.stats {
            let _ = writeln!(out);
            let _ = writeln!(out, "pushed:        {}", stats.pushed);
            let _ = writeln!(out, "dispatched:    {}", stats.dispatched);
            let _ = writeln!(out, "done:          {}", stats.done);
            let _ = writeln!(out, "requeued:      {}", stats.requeued);
            let _ = writeln!(out, "dead-lettered: {}", stats.dead_lettered);
        }
        let _ = writeln!(out, "generated at {}", self.generated_at.to_rfc3339());
        out
    }
}

/// Render `output_dir` and write the report to `report_path`.
pub async fn generate_report(
    output_dir: &Path,
    report_path: &Path,
    stats: Option<DispatchStats>,
) -> AppResult<OutputReport> {
    let report = build_report(output_dir, stats).await?;

    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create report directory: {}", parent.display()),
                    e,
                )
            })?;
        }
    }

    fs::write(report_path, report.render()).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write report: {}", report_path.display()),
            e,
        )
    })?;

    tracing::info!(
        report = %report_path.display(),
        directories = report.directories,
        files = report.files,
        "Wrote output report"
    );
    Ok(report)
}

/// Walk `output_dir` without writing anything.
pub async fn build_report(
    output_dir: &Path,
    stats: Option<DispatchStats>,
) -> AppResult<OutputReport> {
    let root = output_dir.to_path_buf();
    let walk_root = root.clone();
    let listing = tokio::task::spawn_blocking(move || walk(&walk_root))
        .await
        .map_err(|e| AppError::internal(format!("Report task failed: {e}")))?
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to walk output tree: {}", root.display()),
                e,
            )
        })?;

    Ok(OutputReport {
        root,
        directories: listing.directories,
        files: listing.files,
        stats,
        generated_at: Utc::now(),
        tree: listing.text,
    })
}

#[derive(Debug, Default)]
struct Listing {
    text: String,
    directories: u64,
    files: u64,
}

fn walk(root: &Path) -> std::io::Result<Listing> {
    let mut listing = Listing::default();
    listing.text.push_str(&root.display().to_string());
    listing.text.push('\n');
    walk_dir(root, "", &mut listing)?;
    Ok(listing)
}

fn walk_dir(dir: &Path, indent: &str, listing: &mut Listing) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let last = entries.len().saturating_sub(1);
    for (i, entry) in entries.iter().enumerate() {
        let (branch, child_indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let name = entry.file_name().to_string_lossy().to_string();
        listing.text.push_str(indent);
        listing.text.push_str(branch);
        listing.text.push_str(&name);
        listing.text.push('\n');

        if entry.file_type()?.is_dir() {
            listing.directories += 1;
            walk_dir(&entry.path(), &format!("{indent}{child_indent}"), listing)?;
        } else {
            listing.files += 1;
        }
    }
    Ok(())
}
