//! Local filesystem relocation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use filebot_core::error::{AppError, ErrorKind};
use filebot_core::result::AppResult;
use filebot_core::traits::relocator::{RelocationSummary, Relocator};
use filebot_core::types::JobUnit;

/// Moves `input_dir/<n>-*` into `output_dir/<job_ref>/Application_<n>/`.
#[derive(Debug, Clone)]
pub struct LocalRelocator {
    /// Intake directory the files are taken from.
    input_dir: PathBuf,
    /// Root of the output tree.
    output_dir: PathBuf,
}

impl LocalRelocator {
    /// Create a relocator, creating the output root if it is missing.
    pub async fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create output root: {}", output_dir.display()),
                e,
            )
        })?;
        Ok(Self {
            input_dir,
            output_dir,
        })
    }

    /// Destination directory for a unit.
    pub fn destination(&self, unit: &JobUnit) -> PathBuf {
        self.output_dir
            .join(&unit.job_ref)
            .join(unit.application_dir())
    }

    /// Intake file names that belong to `unit`, in enumeration order.
    ///
    /// Names are compared as raw bytes so files whose names are not valid
    /// UTF-8 still move with their application.
    async fn matching_files(&self, unit: &JobUnit) -> AppResult<Vec<OsString>> {
        let prefix = unit.file_prefix();
        let mut dir = fs::read_dir(&self.input_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to list intake directory: {}", self.input_dir.display()),
                e,
            )
        })?;

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read intake entry", e)
        })? {
            let name = entry.file_name();
            if !name.as_encoded_bytes().starts_with(prefix.as_bytes()) {
                continue;
            }
            let file_type = entry.file_type().await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to stat intake entry: {}", name.to_string_lossy()),
                    e,
                )
            })?;
            if file_type.is_file() {
                names.push(name);
            } else {
                debug!(entry = %name.to_string_lossy(), "Skipping non-file intake entry");
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl Relocator for LocalRelocator {
    fn backend(&self) -> &str {
        "local"
    }

    async fn relocate(&self, unit: &JobUnit) -> AppResult<RelocationSummary> {
        let destination = self.destination(unit);
        fs::create_dir_all(&destination).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", destination.display()),
                e,
            )
        })?;

        let mut moved = Vec::new();
        for name in self.matching_files(unit).await? {
            let from = self.input_dir.join(&name);
            let to = destination.join(&name);
            move_file(&from, &to).await?;
            debug!(job = %unit, from = %from.display(), to = %to.display(), "Moved file");
            moved.push(to);
        }

        info!(job = %unit, files = moved.len(), "Relocated application");
        Ok(RelocationSummary { destination, moved })
    }
}

/// Rename, falling back to copy + remove across filesystems.
async fn move_file(from: &Path, to: &Path) -> AppResult<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            fs::copy(from, to).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to copy {} -> {}", from.display(), to.display()),
                    e,
                )
            })?;
            fs::remove_file(from).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to remove {}", from.display()),
                    e,
                )
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::with_source(
            ErrorKind::NotFound,
            format!("Intake file vanished: {}", from.display()),
            e,
        )),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to move {} -> {}", from.display(), to.display()),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fixture() -> (tempfile::TempDir, LocalRelocator) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        let relocator = LocalRelocator::new(&input, dir.path().join("out"))
            .await
            .unwrap();
        (dir, relocator)
    }

    #[tokio::test]
    async fn test_relocate_moves_only_matching_prefix() {
        let (dir, relocator) = fixture().await;
        let input = dir.path().join("in");
        std::fs::write(input.join("1-candidate-data.txt"), "ACME-1\n").unwrap();
        std::fs::write(input.join("1-cv.pdf"), "cv").unwrap();
        std::fs::write(input.join("11-cv.pdf"), "other").unwrap();

        let unit = JobUnit::new("ACME-1", 1).unwrap();
        let summary = relocator.relocate(&unit).await.unwrap();

        assert_eq!(summary.moved.len(), 2);
        let dest = dir.path().join("out/ACME-1/Application_1");
        assert_eq!(summary.destination, dest);
        assert!(dest.join("1-cv.pdf").exists());
        assert!(dest.join("1-candidate-data.txt").exists());
        assert!(input.join("11-cv.pdf").exists());
        assert!(!input.join("1-cv.pdf").exists());
    }

    #[tokio::test]
    async fn test_relocate_twice_is_stable() {
        let (dir, relocator) = fixture().await;
        let input = dir.path().join("in");
        std::fs::write(input.join("2-letter.txt"), "hello").unwrap();

        let unit = JobUnit::new("JOB", 2).unwrap();
        relocator.relocate(&unit).await.unwrap();
        let second = relocator.relocate(&unit).await.unwrap();

        assert!(second.moved.is_empty());
        let dest = dir.path().join("out/JOB/Application_2");
        let entries: Vec<_> = std::fs::read_dir(&dest).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(std::fs::read_to_string(dest.join("2-letter.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_zero_padded_names_do_not_match() {
        let (dir, relocator) = fixture().await;
        let input = dir.path().join("in");
        std::fs::write(input.join("3-cv.pdf"), "cv").unwrap();
        std::fs::write(input.join("03-resume.pdf"), "padded").unwrap();
        std::fs::write(input.join("30-cv.pdf"), "other").unwrap();

        let summary = relocator
            .relocate(&JobUnit::new("ACME", 3).unwrap())
            .await
            .unwrap();

        let dest = dir.path().join("out/ACME/Application_3");
        assert_eq!(summary.moved, vec![dest.join("3-cv.pdf")]);
        assert!(input.join("03-resume.pdf").exists());
        assert!(input.join("30-cv.pdf").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relocate_moves_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (dir, relocator) = fixture().await;
        let input = dir.path().join("in");
        let name = OsStr::from_bytes(b"4-\xffcv.pdf");
        if std::fs::write(input.join(name), "cv").is_err() {
            // Some filesystems refuse names that are not valid UTF-8.
            return;
        }

        let summary = relocator
            .relocate(&JobUnit::new("JOB", 4).unwrap())
            .await
            .unwrap();

        let dest = dir.path().join("out/JOB/Application_4");
        assert_eq!(summary.moved, vec![dest.join(name)]);
        assert!(dest.join(name).exists());
        assert!(!input.join(name).exists());
    }

    #[tokio::test]
    async fn test_missing_intake_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let relocator = LocalRelocator::new(dir.path().join("nope"), dir.path().join("out"))
            .await
            .unwrap();

        let err = relocator
            .relocate(&JobUnit::new("X", 1).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }
}
