//! Verifiable on-disk store of transformed contact-map windows.
//!
//! A build sweeps a half-overlapping window grid over a contact map, keeps
//! the windows that pass the coverage gate and writes them, together with
//! each feature's aligned slice, into flat memory-mapped arrays. Every row is
//! fingerprinted with SHA-256 in `index.json`; reads recompute the digests and
//! fail on any mismatch.
//!
//! ```text
//! <root>/
//!   meta.json        resolution, window size, length, shapes, feature descriptors
//!   index.json       slot -> DiscRow
//!   .maps.npy        (capacity, window_size, window_size) f64
//!   .<feature>.npy   (capacity, window_size) f64
//!   .<feature>.track.tsv
//!   tmp/             staging area for feature tracks before they are renamed into place
//! ```

pub mod config;
pub mod index;
pub mod meta;
pub mod row;
pub mod storage;

// re-exports
pub use config::{BuildConfig, ConfigError, FeatureConfig};
pub use index::{IndexBuilder, StorageIndex};
pub use meta::{FeatureEntry, StorageMeta};
pub use row::{DiscRow, StoredWindow};
pub use storage::{DiscStorage, GenomicSpan, StorageState, grid_capacity, window_bounds};
