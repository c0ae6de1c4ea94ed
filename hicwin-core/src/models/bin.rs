use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

///
/// Bin struct, one fixed-size genomic interval of a contact map
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Serialize, Deserialize)]
pub struct Bin {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Bin {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Bin {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    ///
    /// Get width of the bin in base pairs
    ///
    pub fn width(&self) -> u64 {
        self.end - self.start
    }

    ///
    /// Join key used to align external tables onto the bin grid: `chrom:start`
    ///
    pub fn key(&self) -> String {
        bin_key(&self.chrom, self.start)
    }
}

pub fn bin_key(chrom: &str, start: u64) -> String {
    format!("{}:{}", chrom, start)
}

impl Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

/// Synthesise a single-chromosome bin grid of `n_bins` bins of `resolution` bp.
pub fn uniform_bins(chrom: &str, n_bins: usize, resolution: u32) -> Vec<Bin> {
    let res = resolution as u64;
    (0..n_bins as u64)
        .map(|i| Bin::new(chrom, i * res, (i + 1) * res))
        .collect()
}
