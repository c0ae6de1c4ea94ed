pub const META_FILE: &str = "meta.json";
pub const INDEX_FILE: &str = "index.json";
pub const MAPS_FILE: &str = ".maps.npy";
pub const TMP_DIR: &str = "tmp";

pub const DEFAULT_WINDOW_SIZE: usize = 64;

/// Minimum fraction of usable columns in a window's central block.
pub const COVERAGE_THRESHOLD: f64 = 0.9;

/// Quantile of nonzero cells used to replace exact zeros before the log transform.
pub const ZERO_FILL_QUANTILE: f64 = 0.01;
