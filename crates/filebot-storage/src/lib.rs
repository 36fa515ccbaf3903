//! # filebot-storage
//!
//! Filesystem side of Filebot: moving a job unit's intake files into the
//! structured output tree, and rendering the output tree as a report.

pub mod providers;
pub mod report;

pub use providers::LocalRelocator;
pub use report::{OutputReport, build_report, generate_report};
