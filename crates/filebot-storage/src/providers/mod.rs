//! Relocation backends.

pub mod local;

pub use local::LocalRelocator;
