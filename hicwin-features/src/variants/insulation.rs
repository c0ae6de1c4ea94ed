use std::path::Path;

use log::{info, warn};

use hicwin_core::errors::Result;

use crate::feature::{Feature, FeatureDescriptor, FeatureSource};
use crate::table::{DelimitedTable, Track};

pub const INSULATION_FEATURE: &str = "insulation";

/// Window multipliers of the contact-map resolution used for insulation scores.
pub const INSULATION_WINDOW_FACTORS: [u64; 4] = [3, 5, 10, 25];

/// Conventional insulation windows, in base pairs, for a given resolution.
pub fn insulation_windows(resolution: u32) -> Vec<u64> {
    INSULATION_WINDOW_FACTORS
        .iter()
        .map(|f| f * resolution as u64)
        .collect()
}

/// Column holding the log2 insulation score for `window` bp.
pub fn insulation_column(window: u64) -> String {
    format!("log2_insulation_score_{}", window)
}

///
/// Insulation score track, one table row per bin, a single column selected
/// by name.
///
#[derive(Debug, Clone)]
pub struct InsulationFeature {
    name: String,
    track: Track,
    insulation_file: String,
    insulation_window: String,
    as_integer: bool,
}

impl InsulationFeature {
    ///
    /// Load an insulation table.
    ///
    /// # Arguments
    /// - insulation_file: headered table with `chrom`, `start`, `end` and score columns
    /// - insulation_window: name of the score column to use
    /// - as_integer: truncate scores to integers before gaps are filled
    ///
    pub fn load(insulation_file: &Path, insulation_window: &str, as_integer: bool) -> Result<Self> {
        let table = DelimitedTable::read(insulation_file, true)?;
        let records = table.records(
            table.column("chrom")?,
            table.column("start")?,
            table.column("end")?,
            table.column(insulation_window)?,
        )?;
        let mut track = Track::from_records(records);
        if as_integer {
            track.values.iter_mut().for_each(|v| *v = v.trunc());
        }
        let missing = track.values.iter().filter(|v| v.is_nan()).count();
        if missing > 0 {
            warn!(
                "{} of {} insulation scores are missing and will be interpolated",
                missing,
                track.len()
            );
        }
        let track = track.interpolate()?;
        info!(
            "Loaded {} insulation scores ({}) from {}",
            track.len(),
            insulation_window,
            insulation_file.display()
        );

        Ok(InsulationFeature {
            name: INSULATION_FEATURE.to_string(),
            track,
            insulation_file: insulation_file.display().to_string(),
            insulation_window: insulation_window.to_string(),
            as_integer,
        })
    }

    pub fn from_track(
        track: Track,
        insulation_file: &str,
        insulation_window: &str,
        as_integer: bool,
    ) -> Self {
        InsulationFeature {
            name: INSULATION_FEATURE.to_string(),
            track,
            insulation_file: insulation_file.to_string(),
            insulation_window: insulation_window.to_string(),
            as_integer,
        }
    }

    /// Rename the feature, e.g. to store several insulation windows side by side.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Feature for InsulationFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        self.track.slice(start, end)
    }

    fn describe(&self) -> FeatureDescriptor {
        FeatureDescriptor::new(
            &self.name,
            FeatureSource::Insulation {
                insulation_file: self.insulation_file.clone(),
                insulation_window: self.insulation_window.clone(),
                as_integer: self.as_integer,
            },
        )
    }

    fn track(&self) -> &Track {
        &self.track
    }
}
