//! Job distribution engine for Filebot.
//!
//! This crate provides:
//! - A FIFO work queue of job units
//! - A fixed pool of relocation workers, each behind a private channel pair
//! - A scanner that turns candidate-data files into job units
//! - A directory monitor that raises coalescing rescan triggers
//! - The dispatcher loop that assigns, collects, and retries work
//! - The daemon bootstrap that wires everything together

pub mod channel;
pub mod dispatcher;
pub mod monitor;
pub mod pool;
pub mod queue;
pub mod runner;
pub mod scanner;
pub mod service;
pub mod shutdown;
pub mod trigger;

pub use dispatcher::{Dispatcher, DispatcherState, RunSummary};
pub use pool::{TeardownReport, WorkerPool};
pub use queue::WorkQueue;
pub use scanner::{ScanError, Scanner};
