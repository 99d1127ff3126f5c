//! Shared building blocks for the push ingestion service.
//!
//! Kept free of I/O so the store, job, and API crates can all depend on it.

pub mod error;
pub mod sequence;
pub mod types;
