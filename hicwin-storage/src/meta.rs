use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hicwin_core::errors::Result;
use hicwin_core::utils::write_json_atomic;
use hicwin_features::{FeatureDescriptor, FeatureStats};

/// Per-feature metadata entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeatureEntry {
    #[serde(flatten)]
    pub descriptor: FeatureDescriptor,
    /// `[capacity, window_size]`
    pub shape: [usize; 2],
    /// `null` when no window was accepted.
    pub stats: Option<FeatureStats>,
}

///
/// Contents of `meta.json`.
///
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StorageMeta {
    pub resolution: u32,
    pub window_size: usize,
    /// Number of stored windows.
    pub length: usize,
    /// `[capacity, window_size, window_size]`
    pub memmap_shape: [usize; 3],
    pub features: Vec<FeatureEntry>,
    /// Map array file, relative to the storage root.
    pub maps: String,
    /// Contact-map archive the windows were cut from.
    pub cooler: String,
}

impl StorageMeta {
    pub fn capacity(&self) -> usize {
        self.memmap_shape[0]
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureEntry> {
        self.features.iter().find(|f| f.descriptor.name == name)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    use hicwin_features::FeatureSource;

    #[fixture]
    fn meta() -> StorageMeta {
        StorageMeta {
            resolution: 10_000,
            window_size: 4,
            length: 2,
            memmap_shape: [6, 4, 4],
            features: vec![
                FeatureEntry {
                    descriptor: FeatureDescriptor::new(
                        "compartment",
                        FeatureSource::Compartment {
                            eigvec_file: "eigvec.tsv".to_string(),
                            compartment_resolution: 100_000,
                            component: "E1".to_string(),
                        },
                    ),
                    shape: [6, 4],
                    stats: Some(FeatureStats {
                        min: -1.0,
                        max: 1.0,
                        mean: 0.0,
                        std: 0.5,
                    }),
                },
                FeatureEntry {
                    descriptor: FeatureDescriptor::new(
                        "stripes",
                        FeatureSource::Stripes {
                            stripes_file: "stripes.tsv".to_string(),
                        },
                    ),
                    shape: [6, 4],
                    stats: None,
                },
            ],
            maps: ".maps.npy".to_string(),
            cooler: "sample.hic".to_string(),
        }
    }

    #[rstest]
    fn test_meta_roundtrip(meta: StorageMeta) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.json");
        meta.write(&path).unwrap();
        assert!(!dir.path().join("meta.json.tmp").exists());

        let back = StorageMeta::from_file(&path).unwrap();
        assert_eq!(back, meta);
        assert_eq!(back.capacity(), 6);
    }

    #[rstest]
    fn test_meta_json_layout(meta: StorageMeta) {
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["memmap_shape"], serde_json::json!([6, 4, 4]));
        assert_eq!(json["features"][0]["kind"], "compartment");
        assert_eq!(json["features"][0]["compartment_resolution"], 100_000);
        assert_eq!(json["features"][1]["stats"], serde_json::Value::Null);
        assert_eq!(meta.feature("stripes").unwrap().shape, [6, 4]);
    }
}
