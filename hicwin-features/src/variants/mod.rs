pub mod compartments;
pub mod fountains;
pub mod insulation;
pub mod stripes;

pub use compartments::CompartmentFeature;
pub use fountains::FountainsFeature;
pub use insulation::{InsulationFeature, insulation_column, insulation_windows};
pub use stripes::StripesFeature;
