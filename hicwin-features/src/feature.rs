use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hicwin_core::consts::TMP_DIR;
use hicwin_core::errors::{HicwinError, Result};
use hicwin_core::mmap::MmapArray;

use crate::norms::{FeatureStats, NormKind, normalize};
use crate::table::Track;
use crate::variants::{CompartmentFeature, FountainsFeature, InsulationFeature, StripesFeature};

///
/// A per-bin auxiliary track aligned to the contact-map bin grid.
///
/// Implementors only know how to produce raw values for a bin range and how
/// to describe themselves; persistence, statistics and normalization live in
/// [`FeatureTrack`].
///
pub trait Feature: Debug {
    /// Unique name; used as the digest key in every index row.
    fn name(&self) -> &str;

    /// Raw, gap-free values for bins `[start, end)`.
    fn fetch(&self, start: usize, end: usize) -> Result<Vec<f64>>;

    /// Everything needed to rebuild this feature from the storage root.
    fn describe(&self) -> FeatureDescriptor;

    /// The full interpolated track, persisted next to the arrays.
    fn track(&self) -> &Track;
}

/// Variant specific reconstruction data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureSource {
    Compartment {
        eigvec_file: String,
        compartment_resolution: u32,
        component: String,
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
        as_integer: bool,
    },
}

///
/// Serializable description of a feature, stored in `meta.json`.
///
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeatureDescriptor {
    pub name: String,
    /// Backing array file, relative to the storage root.
    pub path: String,
    /// Persisted interpolated track, relative to the storage root.
    pub track: String,
    #[serde(flatten)]
    pub source: FeatureSource,
}

impl FeatureDescriptor {
    pub fn new(name: &str, source: FeatureSource) -> Self {
        FeatureDescriptor {
            name: name.to_string(),
            path: array_file(name),
            track: track_file(name),
            source,
        }
    }

    ///
    /// Rebuild the feature from its persisted track, without touching the
    /// external tables it was originally loaded from.
    ///
    pub fn restore(&self, root: &Path) -> Result<Box<dyn Feature>> {
        let track = Track::read_tsv(&root.join(&self.track))?;
        let feature: Box<dyn Feature> = match &self.source {
            FeatureSource::Compartment {
                eigvec_file,
                compartment_resolution,
                component,
            } => Box::new(CompartmentFeature::from_track(
                track,
                eigvec_file,
                *compartment_resolution,
                component,
            )),
            FeatureSource::Fountains { fountains_file } => {
                Box::new(FountainsFeature::from_track(track, fountains_file))
            }
            FeatureSource::Stripes { stripes_file } => {
                Box::new(StripesFeature::from_track(track, stripes_file))
            }
            FeatureSource::Insulation {
                insulation_file,
                insulation_window,
                as_integer,
            } => Box::new(
                InsulationFeature::from_track(track, insulation_file, insulation_window, *as_integer)
                    .with_name(&self.name),
            ),
        };
        Ok(feature)
    }
}

pub fn array_file(name: &str) -> String {
    format!(".{}.npy", name)
}

pub fn track_file(name: &str) -> String {
    format!(".{}.track.tsv", name)
}

///
/// Storage machinery shared by every feature: a fixed-shape backing array of
/// `(capacity, window_size)` values, content digests of written rows, summary
/// statistics over the used rows and read-time normalization.
///
#[derive(Debug)]
pub struct FeatureTrack {
    feature: Box<dyn Feature>,
    array: Option<MmapArray>,
    stats: Option<FeatureStats>,
}

impl FeatureTrack {
    pub fn new(feature: Box<dyn Feature>) -> Self {
        FeatureTrack {
            feature,
            array: None,
            stats: None,
        }
    }

    pub fn name(&self) -> &str {
        self.feature.name()
    }

    pub fn feature(&self) -> &dyn Feature {
        self.feature.as_ref()
    }

    pub fn descriptor(&self) -> FeatureDescriptor {
        self.feature.describe()
    }

    pub fn array_path(&self, root: &Path) -> PathBuf {
        root.join(self.descriptor().path)
    }

    pub fn stats(&self) -> Option<&FeatureStats> {
        self.stats.as_ref()
    }

    pub fn set_stats(&mut self, stats: Option<FeatureStats>) {
        self.stats = stats;
    }

    fn array(&self) -> Result<&MmapArray> {
        self.array.as_ref().ok_or_else(|| {
            HicwinError::InvalidArgument(format!("feature '{}' has no storage attached", self.name()))
        })
    }

    ///
    /// Create the backing array. Fails with `AlreadyExists` unless `overwrite`
    /// is set, in which case an existing file is removed first.
    ///
    pub fn allocate_storage(
        &mut self,
        root: &Path,
        window_size: usize,
        capacity: usize,
        overwrite: bool,
    ) -> Result<()> {
        let array = MmapArray::create(self.array_path(root), capacity, window_size, overwrite)?;
        self.array = Some(array);
        Ok(())
    }

    /// Reattach to a previously built backing array.
    pub fn attach(
        &mut self,
        root: &Path,
        window_size: usize,
        capacity: usize,
        writable: bool,
    ) -> Result<()> {
        let array = MmapArray::open(self.array_path(root), capacity, window_size, writable)?;
        self.array = Some(array);
        Ok(())
    }

    ///
    /// Fetch the values for bins `[start, end)`, store them at `slot` and
    /// return the digest of the stored bytes.
    ///
    pub fn persist_window(&mut self, start: usize, end: usize, slot: usize) -> Result<String> {
        let values = self.feature.fetch(start, end)?;
        let name = self.feature.name().to_string();
        let array = self.array.as_mut().ok_or_else(|| {
            HicwinError::InvalidArgument(format!("feature '{}' has no storage attached", name))
        })?;
        array.write_row(slot, &values)
    }

    ///
    /// Write the interpolated track next to the arrays. The table is staged in
    /// `tmp/` under the storage root and renamed into place once complete.
    ///
    pub fn persist_track(&self, root: &Path) -> Result<()> {
        let name = self.descriptor().track;
        let scratch = root.join(TMP_DIR);
        fs::create_dir_all(&scratch)?;
        let staged = scratch.join(&name);
        self.feature.track().write_tsv(&staged)?;
        fs::rename(&staged, root.join(&name))?;
        Ok(())
    }

    /// Compute min/max/mean/std over the first `used_length` rows. Stats that
    /// are not finite cannot be recorded in `meta.json` and are refused.
    pub fn finalize_statistics(&mut self, used_length: usize) -> Result<Option<FeatureStats>> {
        let values = self.array()?.prefix(used_length)?;
        let stats = FeatureStats::compute(&values);
        if let Some(stats) = &stats {
            if !stats.is_finite() {
                return Err(HicwinError::InvalidArgument(format!(
                    "feature '{}' holds non-finite values: {:?}",
                    self.name(),
                    stats
                )));
            }
        }
        self.stats = stats;
        Ok(self.stats)
    }

    pub fn flush(&self) -> Result<()> {
        self.array()?.flush()
    }

    /// Raw values stored at `slot`.
    pub fn stored(&self, slot: usize) -> Result<Vec<f64>> {
        self.array()?.row(slot)
    }

    /// Digest of the bytes stored at `slot`.
    pub fn digest(&self, slot: usize) -> Result<String> {
        self.array()?.digest(slot)
    }

    pub fn normalize(&self, values: &[f64], kind: NormKind) -> Result<Vec<f64>> {
        normalize(values, kind, self.stats.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    use hicwin_core::models::Bin;

    fn stripes(values: Vec<f64>) -> Box<dyn Feature> {
        let bins = (0..values.len() as u64)
            .map(|i| Bin::new("chr1", i * 10, (i + 1) * 10))
            .collect();
        let track = Track::new(bins, values).unwrap();
        Box::new(StripesFeature::from_track(track, "stripes.tsv"))
    }

    #[fixture]
    fn feature_track() -> FeatureTrack {
        FeatureTrack::new(stripes((0..8).map(|v| v as f64).collect()))
    }

    #[rstest]
    fn test_persist_window_and_statistics(mut feature_track: FeatureTrack) {
        let dir = tempdir().unwrap();
        feature_track.allocate_storage(dir.path(), 2, 4, false).unwrap();

        let d0 = feature_track.persist_window(0, 2, 0).unwrap();
        let d1 = feature_track.persist_window(4, 6, 1).unwrap();
        assert_eq!(feature_track.digest(0).unwrap(), d0);
        assert_eq!(feature_track.digest(1).unwrap(), d1);
        assert_eq!(feature_track.stored(1).unwrap(), vec![4.0, 5.0]);

        // unused rows stay out of the statistics
        let stats = feature_track.finalize_statistics(2).unwrap().unwrap();
        assert_eq!((stats.min, stats.max, stats.mean), (0.0, 5.0, 2.5));

        let out = feature_track.normalize(&[0.0, 5.0], NormKind::MinMax).unwrap();
        assert_eq!(out, vec![0.0, 1.0]);
    }

    #[rstest]
    fn test_non_finite_statistics_are_refused() {
        let dir = tempdir().unwrap();
        let mut values = vec![1.0; 4];
        values[1] = f64::INFINITY;
        let mut track = FeatureTrack::new(stripes(values));
        track.allocate_storage(dir.path(), 2, 2, false).unwrap();
        track.persist_window(0, 2, 0).unwrap();

        let result = track.finalize_statistics(1);
        assert!(matches!(result, Err(HicwinError::InvalidArgument(_))));
        assert!(track.stats().is_none());
    }

    #[rstest]
    fn test_allocate_refuses_existing(mut feature_track: FeatureTrack) {
        let dir = tempdir().unwrap();
        feature_track.allocate_storage(dir.path(), 2, 4, false).unwrap();

        let mut again = FeatureTrack::new(stripes(vec![1.0; 8]));
        let result = again.allocate_storage(dir.path(), 2, 4, false);
        assert!(matches!(result, Err(HicwinError::AlreadyExists(_))));
        again.allocate_storage(dir.path(), 2, 4, true).unwrap();
    }

    #[rstest]
    fn test_wrong_window_length_is_rejected(mut feature_track: FeatureTrack) {
        let dir = tempdir().unwrap();
        feature_track.allocate_storage(dir.path(), 2, 4, false).unwrap();
        assert!(feature_track.persist_window(0, 3, 0).is_err());
    }

    #[rstest]
    fn test_unattached_storage_is_an_error(mut feature_track: FeatureTrack) {
        assert!(feature_track.persist_window(0, 2, 0).is_err());
        assert!(feature_track.stored(0).is_err());
    }

    #[rstest]
    fn test_descriptor_restore_roundtrip(feature_track: FeatureTrack) {
        let dir = tempdir().unwrap();
        feature_track.persist_track(dir.path()).unwrap();

        assert!(dir.path().join(".stripes.track.tsv").exists());
        assert!(!dir.path().join(TMP_DIR).join(".stripes.track.tsv").exists());

        let descriptor = feature_track.descriptor();
        assert_eq!(descriptor.path, ".stripes.npy");
        let restored = descriptor.restore(dir.path()).unwrap();
        assert_eq!(restored.describe(), descriptor);
        assert_eq!(restored.fetch(3, 5).unwrap(), vec![3.0, 4.0]);
    }

    fn grid_track() -> Track {
        let bins = (0..6).map(|i| Bin::new("chr2", i * 100, (i + 1) * 100)).collect();
        Track::new(bins, vec![0.5, -1.0, 2.0, 0.0, 3.5, -0.25]).unwrap()
    }

    #[rstest]
    #[case(Box::new(CompartmentFeature::from_track(grid_track(), "eigvec.tsv", 100_000, "E2")))]
    #[case(Box::new(FountainsFeature::from_track(grid_track(), "fountains.tsv")))]
    #[case(Box::new(StripesFeature::from_track(grid_track(), "stripes.tsv")))]
    #[case(Box::new(InsulationFeature::from_track(grid_track(), "ins.tsv", "log2_insulation_score_50000", true)))]
    #[case(Box::new(
        InsulationFeature::from_track(grid_track(), "ins.tsv", "log2_insulation_score_30000", false)
            .with_name("insulation_30k")
    ))]
    fn test_restore_every_variant_from_json(#[case] feature: Box<dyn Feature>) {
        let dir = tempdir().unwrap();
        let track = FeatureTrack::new(feature);
        track.persist_track(dir.path()).unwrap();

        // descriptors travel through meta.json
        let json = serde_json::to_string(&track.descriptor()).unwrap();
        let descriptor: FeatureDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(descriptor, track.descriptor());

        let restored = descriptor.restore(dir.path()).unwrap();
        assert_eq!(restored.name(), track.name());
        assert_eq!(restored.describe(), descriptor);
        assert_eq!(restored.track(), track.feature().track());
        assert_eq!(restored.fetch(1, 4).unwrap(), vec![-1.0, 2.0, 0.0]);
    }

    #[rstest]
    fn test_descriptor_json_layout() {
        let descriptor = FeatureDescriptor::new(
            "insulation",
            FeatureSource::Insulation {
                insulation_file: "ins.tsv".to_string(),
                insulation_window: "log2_insulation_score_50000".to_string(),
                as_integer: false,
            },
        );
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["kind"], "insulation");
        assert_eq!(json["path"], ".insulation.npy");
        assert_eq!(json["insulation_window"], "log2_insulation_score_50000");

        let back: FeatureDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, descriptor);
    }
}
