//! Intake directory scanner.
//!
//! Each pass lists the intake directory, picks out `<n>-candidate-data.txt`
//! files, and turns each into a [`JobUnit`] whose job reference is the first
//! line of that file.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing;

use filebot_core::config::ScanPolicy;
use filebot_core::error::{AppError, ErrorKind};
use filebot_core::types::{DescriptorError, JobUnit};

/// Filename suffix after `<app_num>` that marks a candidate-data file.
pub const CANDIDATE_DATA_SUFFIX: &str = "-candidate-data.txt";

/// Failure of one scan pass.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The intake directory could not be listed.
    #[error("cannot read intake directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The filename prefix is not a decimal number.
    #[error("invalid application number in '{name}'")]
    InvalidApplicationNumber { name: String },
    /// The filename prefix is zero.
    #[error("application number must be at least 1 in '{name}'")]
    ZeroApplicationNumber { name: String },
    /// The candidate-data file could not be read.
    #[error("cannot read candidate data {path}: {source}")]
    UnreadableCandidateData {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The candidate-data file has an empty first line.
    #[error("empty job reference in {path}")]
    EmptyJobReference { path: PathBuf },
    /// The first line cannot be used as a job reference.
    #[error("invalid job reference in {path}: {source}")]
    InvalidJobReference {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError::with_source(ErrorKind::Scan, err.to_string(), err)
    }
}

/// Whether `name` follows the candidate-data naming pattern.
pub fn is_candidate_data(name: &str) -> bool {
    name.ends_with(CANDIDATE_DATA_SUFFIX)
}

/// Application number encoded as the digits before the first `-`.
///
/// The digits must be the canonical decimal form (`3`, not `03`), since
/// relocation matches intake files on the `<n>-` prefix rebuilt from it.
pub fn parse_application_number(name: &str) -> Result<u32, ScanError> {
    let prefix = name.split('-').next().unwrap_or_default();
    if prefix.is_empty()
        || !prefix.bytes().all(|b| b.is_ascii_digit())
        || (prefix.len() > 1 && prefix.starts_with('0'))
    {
        return Err(ScanError::InvalidApplicationNumber {
            name: name.to_string(),
        });
    }
    match prefix.parse::<u32>() {
        Ok(0) => Err(ScanError::ZeroApplicationNumber {
            name: name.to_string(),
        }),
        Ok(n) => Ok(n),
        Err(_) => Err(ScanError::InvalidApplicationNumber {
            name: name.to_string(),
        }),
    }
}

/// First line of a candidate-data file, with surrounding whitespace removed.
pub async fn read_job_reference(path: &Path) -> Result<String, ScanError> {
    let unreadable = |source| ScanError::UnreadableCandidateData {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).await.map_err(unreadable)?;
    let mut lines = BufReader::new(file).lines();
    let first = lines.next_line().await.map_err(unreadable)?;

    match first.as_deref().map(str::trim) {
        Some(line) if !line.is_empty() => Ok(line.to_string()),
        _ => Err(ScanError::EmptyJobReference {
            path: path.to_path_buf(),
        }),
    }
}

/// Scanner bound to one intake directory.
#[derive(Debug, Clone)]
pub struct Scanner {
    intake_dir: PathBuf,
    policy: ScanPolicy,
}

impl Scanner {
    /// Create a scanner for `intake_dir`.
    pub fn new(intake_dir: impl Into<PathBuf>, policy: ScanPolicy) -> Self {
        Self {
            intake_dir: intake_dir.into(),
            policy,
        }
    }

    /// Directory this scanner reads.
    pub fn intake_dir(&self) -> &Path {
        &self.intake_dir
    }

    /// How a bad entry is treated.
    pub fn policy(&self) -> ScanPolicy {
        self.policy
    }

    /// Run one pass and return the units found, ordered by application number.
    ///
    /// Under [`ScanPolicy::Abort`] the first bad entry fails the pass and
    /// nothing is returned. Under [`ScanPolicy::Skip`] bad entries are logged
    /// and left out. A directory that cannot be listed always fails.
    pub async fn scan(&self) -> Result<Vec<JobUnit>, ScanError> {
        let read_dir_err = |source| ScanError::ReadDir {
            path: self.intake_dir.clone(),
            source,
        };
        let mut entries = fs::read_dir(&self.intake_dir).await.map_err(read_dir_err)?;
        let mut units = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_candidate_data(name) {
                continue;
            }

            match self.scan_entry(name, &entry.path()).await {
                Ok(unit) => units.push(unit),
                Err(e) => match self.policy {
                    ScanPolicy::Abort => return Err(e),
                    ScanPolicy::Skip => {
                        tracing::warn!(entry = name, "Skipping intake entry: {}", e);
                    }
                },
            }
        }

        units.sort_by_key(|u| u.app_num);
        tracing::debug!(
            dir = %self.intake_dir.display(),
            found = units.len(),
            "Scan complete"
        );
        Ok(units)
    }

    async fn scan_entry(&self, name: &str, path: &Path) -> Result<JobUnit, ScanError> {
        let app_num = parse_application_number(name)?;
        let job_ref = read_job_reference(path).await?;
        JobUnit::new(job_ref, app_num).map_err(|source| ScanError::InvalidJobReference {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One pass over `intake_dir` that fails on the first bad entry.
pub async fn scan(intake_dir: &Path) -> Result<Vec<JobUnit>, ScanError> {
    Scanner::new(intake_dir, ScanPolicy::Abort).scan().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_parse_application_number() {
        assert_eq!(parse_application_number("3-candidate-data.txt").unwrap(), 3);
        assert_eq!(parse_application_number("42-resume.pdf").unwrap(), 42);
        assert!(matches!(
            parse_application_number("03-candidate-data.txt"),
            Err(ScanError::InvalidApplicationNumber { .. })
        ));
        assert!(matches!(
            parse_application_number("00-candidate-data.txt"),
            Err(ScanError::InvalidApplicationNumber { .. })
        ));
        assert!(matches!(
            parse_application_number("abc-candidate-data.txt"),
            Err(ScanError::InvalidApplicationNumber { .. })
        ));
        assert!(matches!(
            parse_application_number("3a-candidate-data.txt"),
            Err(ScanError::InvalidApplicationNumber { .. })
        ));
        assert!(matches!(
            parse_application_number("-candidate-data.txt"),
            Err(ScanError::InvalidApplicationNumber { .. })
        ));
        assert!(matches!(
            parse_application_number("0-candidate-data.txt"),
            Err(ScanError::ZeroApplicationNumber { .. })
        ));
        assert!(matches!(
            parse_application_number("99999999999-candidate-data.txt"),
            Err(ScanError::InvalidApplicationNumber { .. })
        ));
    }

    #[tokio::test]
    async fn test_scan_finds_candidate_data_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "3-candidate-data.txt", "IBM-000123\n");
        write(dir.path(), "3-resume.pdf", "pdf");
        write(dir.path(), "1-candidate-data.txt", "ACME-7\r\nsecond line\n");
        write(dir.path(), "notes.txt", "ignored");

        let units = scan(dir.path()).await.unwrap();
        assert_eq!(
            units,
            vec![
                JobUnit::new("ACME-7", 1).unwrap(),
                JobUnit::new("IBM-000123", 3).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_name_aborts_pass() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "2-candidate-data.txt", "GOOD\n");
        write(dir.path(), "abc-candidate-data.txt", "BAD\n");

        let err = scan(dir.path()).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidApplicationNumber { .. }));
        assert!(AppError::from(err).is(ErrorKind::Scan));
    }

    #[tokio::test]
    async fn test_skip_policy_keeps_good_entries() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "2-candidate-data.txt", "GOOD\n");
        write(dir.path(), "abc-candidate-data.txt", "BAD\n");
        write(dir.path(), "5-candidate-data.txt", "\n");
        write(dir.path(), "6-candidate-data.txt", "HAS/SLASH\n");

        let units = Scanner::new(dir.path(), ScanPolicy::Skip)
            .scan()
            .await
            .unwrap();
        assert_eq!(units, vec![JobUnit::new("GOOD", 2).unwrap()]);
    }

    #[tokio::test]
    async fn test_zero_padded_name_aborts_pass() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "03-candidate-data.txt", "IBM-1\n");
        write(dir.path(), "03-resume.pdf", "pdf");

        assert!(matches!(
            scan(dir.path()).await,
            Err(ScanError::InvalidApplicationNumber { .. })
        ));
        let units = Scanner::new(dir.path(), ScanPolicy::Skip)
            .scan()
            .await
            .unwrap();
        assert!(units.is_empty());
    }

    #[tokio::test]
    async fn test_dot_job_reference_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "5-candidate-data.txt", "..\n");

        assert!(matches!(
            scan(dir.path()).await,
            Err(ScanError::InvalidJobReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_job_reference_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "4-candidate-data.txt", "");

        assert!(matches!(
            scan(dir.path()).await,
            Err(ScanError::EmptyJobReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan(&missing).await,
            Err(ScanError::ReadDir { .. })
        ));
    }
}
