//! Core library for hicwin.
//!
//! Shared building blocks for the windowed contact-map store:
//!
//! - [`models`] - genomic bins and the [`models::ContactSource`] abstraction
//! - [`mmap`] - memory-mapped flat `f64` arrays with per-row SHA-256 digests
//! - [`errors`] - the error taxonomy used across the workspace
//! - [`utils`] - gz-aware readers and atomic JSON writes

pub mod consts;
pub mod errors;
pub mod mmap;
pub mod models;
pub mod utils;

// re-exports
pub use errors::{HicwinError, Result};
pub use mmap::MmapArray;
