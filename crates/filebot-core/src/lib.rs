//! # filebot-core
//!
//! Core crate for Filebot. Contains the configuration schema and loader,
//! the job-unit types and their wire format, the relocation trait,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Filebot crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
