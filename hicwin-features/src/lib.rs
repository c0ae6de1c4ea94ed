//! Auxiliary per-bin tracks stored next to contact-map windows.
//!
//! Every feature exposes raw values for a bin range through the [`Feature`]
//! trait; [`FeatureTrack`] adds the shared storage machinery (backing arrays,
//! row digests, summary statistics and read-time normalization).

pub mod feature;
pub mod norms;
pub mod table;
pub mod variants;

// re-exports
pub use feature::{Feature, FeatureDescriptor, FeatureSource, FeatureTrack};
pub use norms::{FeatureStats, NormKind, normalize};
pub use table::{DelimitedTable, Track};
pub use variants::{
    CompartmentFeature, FountainsFeature, InsulationFeature, StripesFeature, insulation_column,
    insulation_windows,
};
