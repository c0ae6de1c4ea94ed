use std::path::Path;

use log::info;

use hicwin_core::errors::Result;

use crate::feature::{Feature, FeatureDescriptor, FeatureSource};
use crate::table::{DelimitedTable, Track};

pub const STRIPES_FEATURE: &str = "stripes";

///
/// Stripe cross scores. The table has no header and is taken positionally:
/// row `i` belongs to bin `i`.
///
#[derive(Debug, Clone)]
pub struct StripesFeature {
    track: Track,
    stripes_file: String,
}

impl StripesFeature {
    pub fn load(stripes_file: &Path) -> Result<Self> {
        let table = DelimitedTable::read(stripes_file, false)?;
        let track = Track::from_records(table.records(0, 1, 2, 3)?).interpolate()?;
        info!(
            "Loaded {} stripe scores from {}",
            track.len(),
            stripes_file.display()
        );

        Ok(StripesFeature {
            track,
            stripes_file: stripes_file.display().to_string(),
        })
    }

    pub fn from_track(track: Track, stripes_file: &str) -> Self {
        StripesFeature {
            track,
            stripes_file: stripes_file.to_string(),
        }
    }
}

impl Feature for StripesFeature {
    fn name(&self) -> &str {
        STRIPES_FEATURE
    }

    fn fetch(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        self.track.slice(start, end)
    }

    fn describe(&self) -> FeatureDescriptor {
        FeatureDescriptor::new(
            STRIPES_FEATURE,
            FeatureSource::Stripes {
                stripes_file: self.stripes_file.clone(),
            },
        )
    }

    fn track(&self) -> &Track {
        &self.track
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    #[rstest]
    fn test_load_stripes_positionally() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stripes.tsv");
        fs::write(
            &path,
            "chr1\t0\t10\t1.0\nchr1\t10\t20\tnan\nchr1\t20\t30\t5.0\nchr1\t30\t40\t7.0\n",
        )
        .unwrap();

        let feature = StripesFeature::load(&path).unwrap();
        assert_eq!(feature.track().len(), 4);
        assert_eq!(feature.fetch(0, 3).unwrap(), vec![1.0, 3.0, 5.0]);
        assert_eq!(feature.fetch(3, 4).unwrap(), vec![7.0]);
        assert!(feature.fetch(3, 5).is_err());
    }

    #[rstest]
    fn test_all_missing_scores_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stripes.tsv");
        fs::write(&path, "chr1\t0\t10\tNA\nchr1\t10\t20\tNA\n").unwrap();
        assert!(StripesFeature::load(&path).is_err());
    }
}
