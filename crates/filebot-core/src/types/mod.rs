//! Job-unit types and the text tokens exchanged with workers.

pub mod job;
pub mod outcome;
pub mod stats;

pub use job::{DescriptorError, JobUnit};
pub use outcome::WorkerOutcome;
pub use stats::DispatchStats;
