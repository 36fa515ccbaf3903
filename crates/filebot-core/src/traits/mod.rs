//! Core traits defined in `filebot-core` and implemented by other crates.

pub mod relocator;

pub use relocator::{RelocationSummary, Relocator};
