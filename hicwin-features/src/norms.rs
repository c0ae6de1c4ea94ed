use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use hicwin_core::errors::{HicwinError, Result};

/// Read-time normalization applied to stored feature values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormKind {
    #[default]
    None,
    MinMax,
    Z,
}

impl FromStr for NormKind {
    type Err = HicwinError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(NormKind::None),
            "minmax" => Ok(NormKind::MinMax),
            "z" | "znorm" => Ok(NormKind::Z),
            _ => Err(HicwinError::InvalidArgument(format!(
                "unknown normalization kind: {}",
                s
            ))),
        }
    }
}

impl TryFrom<u8> for NormKind {
    type Error = HicwinError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(NormKind::None),
            1 => Ok(NormKind::MinMax),
            2 => Ok(NormKind::Z),
            _ => Err(HicwinError::InvalidArgument(format!(
                "unknown normalization code: {}",
                code
            ))),
        }
    }
}

impl Display for NormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormKind::None => "none",
            NormKind::MinMax => "minmax",
            NormKind::Z => "z",
        };
        write!(f, "{}", name)
    }
}

/// Summary statistics over the used prefix of a feature array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl FeatureStats {
    /// `None` for an empty slice.
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let (min, max, sum) = values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), &v| (lo.min(v), hi.max(v), sum + v),
        );
        let mean = sum / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(FeatureStats {
            min,
            max,
            mean,
            std: var.sqrt(),
        })
    }

    pub fn is_finite(&self) -> bool {
        [self.min, self.max, self.mean, self.std]
            .iter()
            .all(|v| v.is_finite())
    }
}

///
/// Normalize raw feature values with precomputed statistics.
///
/// A degenerate spread (`max == min`, or `std == 0`) maps every value to `0.0`.
///
pub fn normalize(values: &[f64], kind: NormKind, stats: Option<&FeatureStats>) -> Result<Vec<f64>> {
    let require = || {
        stats.ok_or_else(|| {
            HicwinError::InvalidArgument(format!(
                "{} normalization requested but no statistics were recorded",
                kind
            ))
        })
    };
    let (shift, scale) = match kind {
        NormKind::None => return Ok(values.to_vec()),
        NormKind::MinMax => {
            let stats = require()?;
            (stats.min, stats.max - stats.min)
        }
        NormKind::Z => {
            let stats = require()?;
            (stats.mean, stats.std)
        }
    };
    if scale == 0.0 {
        return Ok(vec![0.0; values.len()]);
    }
    Ok(values.iter().map(|v| (v - shift) / scale).collect())
}
