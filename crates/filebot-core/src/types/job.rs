//! The job unit and its `"<job_ref>/<app_num>"` descriptor token.

use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AppError, ErrorKind};

/// Separator between the job reference and the application number.
pub const DESCRIPTOR_SEPARATOR: char = '/';

/// One candidate's file set for one application.
///
/// The `Display` form is the descriptor sent over worker channels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobUnit {
    /// Opaque job reference read from the candidate-data file.
    pub job_ref: String,
    /// Application number, always >= 1.
    pub app_num: u32,
}

/// Error from parsing or building a job descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The token has no `/` separator.
    #[error("descriptor '{0}' has no '/' separator")]
    MissingSeparator(String),
    /// The job reference is empty, `.`/`..`, or contains a separator.
    #[error("invalid job reference '{0}'")]
    InvalidJobRef(String),
    /// The application number is not a positive decimal.
    #[error("invalid application number '{0}'")]
    InvalidAppNum(String),
    /// The token carries leading or trailing whitespace.
    #[error("descriptor '{0}' has surrounding whitespace")]
    Whitespace(String),
}

impl From<DescriptorError> for AppError {
    fn from(err: DescriptorError) -> Self {
        AppError::with_source(ErrorKind::Validation, err.to_string(), err)
    }
}

impl JobUnit {
    /// Build a job unit, checking the same rules as the wire format.
    pub fn new(job_ref: impl Into<String>, app_num: u32) -> Result<Self, DescriptorError> {
        let job_ref = job_ref.into();
        if job_ref.is_empty()
            || job_ref.contains(DESCRIPTOR_SEPARATOR)
            || job_ref.trim() != job_ref
            || !is_single_path_component(&job_ref)
        {
            return Err(DescriptorError::InvalidJobRef(job_ref));
        }
        if app_num == 0 {
            return Err(DescriptorError::InvalidAppNum(app_num.to_string()));
        }
        Ok(Self { job_ref, app_num })
    }

    /// The descriptor token, e.g. `IBM-000123/3`.
    pub fn descriptor(&self) -> String {
        self.to_string()
    }

    /// Filename prefix shared by every intake file of this application.
    pub fn file_prefix(&self) -> String {
        format!("{}-", self.app_num)
    }

    /// Directory name of this application under the job reference.
    pub fn application_dir(&self) -> String {
        format!("Application_{}", self.app_num)
    }
}

/// The job reference names one directory directly under the output root.
fn is_single_path_component(job_ref: &str) -> bool {
    let mut components = Path::new(job_ref).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl fmt::Display for JobUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.job_ref, DESCRIPTOR_SEPARATOR, self.app_num)
    }
}

impl FromStr for JobUnit {
    type Err = DescriptorError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.trim() != token {
            return Err(DescriptorError::Whitespace(token.to_string()));
        }
        let (job_ref, app_num) = token
            .rsplit_once(DESCRIPTOR_SEPARATOR)
            .ok_or_else(|| DescriptorError::MissingSeparator(token.to_string()))?;

        if app_num.is_empty() || !app_num.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DescriptorError::InvalidAppNum(app_num.to_string()));
        }
        let app_num: u32 = app_num
            .parse()
            .map_err(|_| DescriptorError::InvalidAppNum(app_num.to_string()))?;

        Self::new(job_ref, app_num)
    }
}
