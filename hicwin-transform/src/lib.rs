//! Contact-map window transforms.
//!
//! A window is cut out of a larger block that carries one window of flanking
//! context on each side. The pipeline is:
//!
//! 1. coverage gate on the central block (at least 90% usable columns)
//! 2. observed/expected normalization over bins that are not entirely missing
//! 3. linear interpolation of the remaining gaps
//! 4. exact zeros replaced by the 1st percentile of nonzero values
//! 5. `log2`
//!
//! Only the central block of the result is kept.

pub mod expected;
pub mod interpolate;
pub mod window;

// re-exports
pub use expected::observed_over_expected;
pub use interpolate::{interp_nan, interp_nan_2d, interp_nan_inplace};
pub use window::{RejectReason, WindowTransform, WindowVerdict, quantile, transform_window};
