use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hicwin_core::consts::DEFAULT_WINDOW_SIZE;
use hicwin_core::errors::{HicwinError, Result};
use hicwin_core::models::Bin;
use hicwin_features::{
    CompartmentFeature, Feature, FountainsFeature, InsulationFeature, StripesFeature,
};

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

/// One `[[features]]` table of a build config.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureConfig {
    Compartment {
        eigvec_file: String,
        compartment_resolution: u32,
        component: Option<String>,
    },
    Fountains {
        fountains_file: String,
    },
    Stripes {
        stripes_file: String,
    },
    Insulation {
        insulation_file: String,
        insulation_window: String,
        #[serde(default)]
        as_integer: bool,
        name: Option<String>,
    },
}

impl FeatureConfig {
    ///
    /// Load the feature this entry describes. Relative file names are resolved
    /// against the storage root.
    ///
    /// # Arguments
    /// - root: storage root directory
    /// - bins: bin grid of the contact map, for features joined by coordinate
    ///
    pub fn load(&self, root: &Path, bins: &[Bin]) -> Result<Box<dyn Feature>> {
        let feature: Box<dyn Feature> = match self {
            FeatureConfig::Compartment {
                eigvec_file,
                compartment_resolution,
                component,
            } => Box::new(CompartmentFeature::load(
                &root.join(eigvec_file),
                bins,
                *compartment_resolution,
                component.as_deref(),
            )?),
            FeatureConfig::Fountains { fountains_file } => {
                Box::new(FountainsFeature::load(&root.join(fountains_file), bins)?)
            }
            FeatureConfig::Stripes { stripes_file } => {
                Box::new(StripesFeature::load(&root.join(stripes_file))?)
            }
            FeatureConfig::Insulation {
                insulation_file,
                insulation_window,
                as_integer,
                name,
            } => {
                let feature =
                    InsulationFeature::load(&root.join(insulation_file), insulation_window, *as_integer)?;
                match name {
                    Some(name) => Box::new(feature.with_name(name)),
                    None => Box::new(feature),
                }
            }
        };
        Ok(feature)
    }
}

///
/// Build parameters read from a TOML file.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Contact-map archive, relative to the storage root.
    pub archive: String,
    pub resolution: u32,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default)]
    pub force_rewrite: bool,
    #[serde(default)]
    pub features: Vec<FeatureConfig>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Window size must be positive")]
    InvalidWindowSize,
    #[error("Resolution must be positive")]
    InvalidResolution,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for HicwinError {
    fn from(err: ConfigError) -> Self {
        HicwinError::Config(err.to_string())
    }
}

impl BuildConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize);
        }
        if self.resolution == 0 {
            return Err(ConfigError::InvalidResolution);
        }
        Ok(())
    }
}

impl TryFrom<&Path> for BuildConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> ConfigResult<Self> {
        let toml_str = read_to_string(path)?;
        let config: BuildConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
