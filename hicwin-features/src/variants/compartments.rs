use std::path::Path;

use log::info;

use hicwin_core::errors::Result;
use hicwin_core::models::Bin;

use crate::feature::{Feature, FeatureDescriptor, FeatureSource};
use crate::table::{DelimitedTable, Track};

pub const COMPARTMENT_FEATURE: &str = "compartment";
pub const DEFAULT_COMPONENT: &str = "E1";

///
/// A/B compartment signal: one eigenvector component computed on a coarser
/// resolution and projected onto the contact-map bin grid.
///
#[derive(Debug, Clone)]
pub struct CompartmentFeature {
    track: Track,
    eigvec_file: String,
    compartment_resolution: u32,
    component: String,
}

impl CompartmentFeature {
    ///
    /// Load an eigenvector table and align it to `bins`.
    ///
    /// # Arguments
    /// - eigvec_file: headered table with `chrom`, `start`, `end` and the component columns
    /// - bins: bin grid of the contact map
    /// - compartment_resolution: resolution the eigenvectors were computed at
    /// - component: column to use, `E1` when `None`
    ///
    pub fn load(
        eigvec_file: &Path,
        bins: &[Bin],
        compartment_resolution: u32,
        component: Option<&str>,
    ) -> Result<Self> {
        let component = component.unwrap_or(DEFAULT_COMPONENT);
        let table = DelimitedTable::read(eigvec_file, true)?;
        let records = table.records(
            table.column("chrom")?,
            table.column("start")?,
            table.column("end")?,
            table.column(component)?,
        )?;
        let track = Track::join_onto(bins, &records).interpolate()?;
        info!(
            "Loaded {} compartment values ({} at {}bp) from {}",
            track.len(),
            component,
            compartment_resolution,
            eigvec_file.display()
        );

        Ok(CompartmentFeature {
            track,
            eigvec_file: eigvec_file.display().to_string(),
            compartment_resolution,
            component: component.to_string(),
        })
    }

    pub fn from_track(
        track: Track,
        eigvec_file: &str,
        compartment_resolution: u32,
        component: &str,
    ) -> Self {
        CompartmentFeature {
            track,
            eigvec_file: eigvec_file.to_string(),
            compartment_resolution,
            component: component.to_string(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Feature for CompartmentFeature {
    fn name(&self) -> &str {
        COMPARTMENT_FEATURE
    }

    fn fetch(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        self.track.slice(start, end)
    }

    fn describe(&self) -> FeatureDescriptor {
        FeatureDescriptor::new(
            COMPARTMENT_FEATURE,
            FeatureSource::Compartment {
                eigvec_file: self.eigvec_file.clone(),
                compartment_resolution: self.compartment_resolution,
                component: self.component.clone(),
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

    use hicwin_core::models::bin::uniform_bins;

    const EIGS: &str = "chrom\tstart\tend\tE1\tE2\tE3\n\
                        chr1\t0\t100\t1.0\t-1.0\t0.0\n\
                        chr1\t200\t300\t3.0\t1.0\t0.5\n\
                        chr1\t300\t400\tNA\t2.0\t0.5\n";

    #[fixture]
    fn eigvec_file() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eigvec.tsv");
        fs::write(&path, EIGS).unwrap();
        (dir, path)
    }

    #[rstest]
    fn test_load_defaults_to_first_component(eigvec_file: (tempfile::TempDir, std::path::PathBuf)) {
        let (_dir, path) = eigvec_file;
        let bins = uniform_bins("chr1", 4, 100);
        let feature = CompartmentFeature::load(&path, &bins, 100, None).unwrap();

        assert_eq!(feature.component(), "E1");
        // bin 1 is missing from the table, bin 3 holds NA
        assert_eq!(feature.fetch(0, 4).unwrap(), vec![1.0, 2.0, 3.0, 3.0]);
    }

    #[rstest]
    fn test_load_other_component(eigvec_file: (tempfile::TempDir, std::path::PathBuf)) {
        let (_dir, path) = eigvec_file;
        let bins = uniform_bins("chr1", 4, 100);
        let feature = CompartmentFeature::load(&path, &bins, 100, Some("E2")).unwrap();
        assert_eq!(feature.fetch(1, 3).unwrap(), vec![0.0, 1.0]);

        match feature.describe().source {
            FeatureSource::Compartment { component, compartment_resolution, .. } => {
                assert_eq!(component, "E2");
                assert_eq!(compartment_resolution, 100);
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[rstest]
    fn test_unknown_component(eigvec_file: (tempfile::TempDir, std::path::PathBuf)) {
        let (_dir, path) = eigvec_file;
        let bins = uniform_bins("chr1", 4, 100);
        assert!(CompartmentFeature::load(&path, &bins, 100, Some("E7")).is_err());
    }

    #[rstest]
    fn test_fetch_out_of_range(eigvec_file: (tempfile::TempDir, std::path::PathBuf)) {
        let (_dir, path) = eigvec_file;
        let bins = uniform_bins("chr1", 4, 100);
        let feature = CompartmentFeature::load(&path, &bins, 100, None).unwrap();
        assert!(feature.fetch(2, 6).is_err());
    }
}
