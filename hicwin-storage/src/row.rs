use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use hicwin_core::errors::{HicwinError, Result};
use hicwin_core::mmap::MmapArray;
use hicwin_features::{FeatureTrack, NormKind};

/// Field names a feature may not take, since they share the row object.
pub const RESERVED_FIELDS: [&str; 4] = ["idx", "start_position", "end_position", "map"];

///
/// Integrity record of one stored window: its slot, bin range and the SHA-256
/// digest of every array row written for it.
///
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiscRow {
    pub idx: usize,
    pub start_position: usize,
    pub end_position: usize,
    /// Digest of the map row.
    pub map: String,
    /// Feature name -> digest of that feature's row.
    #[serde(flatten)]
    pub features: BTreeMap<String, String>,
}

/// A verified window as handed to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredWindow {
    pub idx: usize,
    pub start_position: usize,
    pub end_position: usize,
    pub map: Array2<f64>,
    pub features: BTreeMap<String, Vec<f64>>,
}

impl DiscRow {
    pub fn new(idx: usize, start_position: usize, end_position: usize, map: String) -> Self {
        DiscRow {
            idx,
            start_position,
            end_position,
            map,
            features: BTreeMap::new(),
        }
    }

    pub fn set_feature(&mut self, name: &str, digest: String) {
        self.features.insert(name.to_string(), digest);
    }

    ///
    /// Check every requested digest against the bytes currently stored and
    /// return the window.
    ///
    /// # Arguments
    /// - slot: the slot this row was looked up by; must equal `idx`
    /// - maps: map array of shape `(capacity, window_size * window_size)`
    /// - window_size: side of a stored window
    /// - features: features to verify and return
    /// - norm: normalization applied to feature values (the map is returned as stored)
    ///
    pub fn verify_and_load(
        &self,
        slot: usize,
        maps: &MmapArray,
        window_size: usize,
        features: &[&FeatureTrack],
        norm: NormKind,
    ) -> Result<StoredWindow> {
        if self.idx != slot {
            return Err(HicwinError::InvalidArgument(format!(
                "row {} was requested as slot {}",
                self.idx, slot
            )));
        }

        if maps.digest(slot)? != self.map {
            return Err(HicwinError::Corruption {
                slot,
                target: "map".to_string(),
            });
        }
        let map = Array2::from_shape_vec((window_size, window_size), maps.row(slot)?)
            .map_err(|e| HicwinError::InvalidArgument(format!("bad map row shape: {}", e)))?;

        let mut values = BTreeMap::new();
        for track in features {
            let name = track.name();
            let expected = self
                .features
                .get(name)
                .ok_or_else(|| HicwinError::UnknownFeature(name.to_string()))?;
            if &track.digest(slot)? != expected {
                return Err(HicwinError::Corruption {
                    slot,
                    target: name.to_string(),
                });
            }
            let raw = track.stored(slot)?;
            values.insert(name.to_string(), track.normalize(&raw, norm)?);
        }

        Ok(StoredWindow {
            idx: self.idx,
            start_position: self.start_position,
            end_position: self.end_position,
            map,
            features: values,
        })
    }
}
