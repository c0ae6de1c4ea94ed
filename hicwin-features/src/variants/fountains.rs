use std::path::Path;

use log::info;

use hicwin_core::errors::Result;
use hicwin_core::models::Bin;

use crate::feature::{Feature, FeatureDescriptor, FeatureSource};
use crate::table::{DelimitedTable, Track};

pub const FOUNTAINS_FEATURE: &str = "fountains";
const FOUNTAIN_SCORE: &str = "FS";

/// Fountain score track joined onto the bin grid.
#[derive(Debug, Clone)]
pub struct FountainsFeature {
    track: Track,
    fountains_file: String,
}

impl FountainsFeature {
    ///
    /// Load a fountain score table. The first column is a row index and is
    /// ignored; rows are matched to `bins` by `chrom:start`.
    ///
    pub fn load(fountains_file: &Path, bins: &[Bin]) -> Result<Self> {
        let table = DelimitedTable::read(fountains_file, true)?;
        let records = table.records(
            table.column("chrom")?,
            table.column("start")?,
            table.column("end")?,
            table.column(FOUNTAIN_SCORE)?,
        )?;
        let track = Track::join_onto(bins, &records).interpolate()?;
        info!(
            "Loaded {} fountain scores from {}",
            track.len(),
            fountains_file.display()
        );

        Ok(FountainsFeature {
            track,
            fountains_file: fountains_file.display().to_string(),
        })
    }

    pub fn from_track(track: Track, fountains_file: &str) -> Self {
        FountainsFeature {
            track,
            fountains_file: fountains_file.to_string(),
        }
    }
}

impl Feature for FountainsFeature {
    fn name(&self) -> &str {
        FOUNTAINS_FEATURE
    }

    fn fetch(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        self.track.slice(start, end)
    }

    fn describe(&self) -> FeatureDescriptor {
        FeatureDescriptor::new(
            FOUNTAINS_FEATURE,
            FeatureSource::Fountains {
                fountains_file: self.fountains_file.clone(),
            },
        )
    }

    fn track(&self) -> &Track {
        &self.track
    }
}
