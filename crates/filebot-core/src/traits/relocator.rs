//! Relocation trait for moving one job unit's files into the output tree.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::JobUnit;

/// Files moved by one successful relocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RelocationSummary {
    /// Destination directory, `output_dir/<job_ref>/Application_<n>`.
    pub destination: PathBuf,
    /// Destination paths of the files moved by this call.
    pub moved: Vec<PathBuf>,
}

/// Trait for relocation backends.
///
/// A relocation either moves every matching file or returns an error, and
/// calling it again on the same unit must converge on the same output tree.
/// The [`Relocator`] trait is defined here in `filebot-core` and implemented
/// in `filebot-storage`.
#[async_trait]
pub trait Relocator: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g., "local").
    fn backend(&self) -> &str;

    /// Move every intake file of `unit` into its application directory.
    async fn relocate(&self, unit: &JobUnit) -> AppResult<RelocationSummary>;
}
