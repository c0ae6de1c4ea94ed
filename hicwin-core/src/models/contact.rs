use std::path::{Path, PathBuf};

use ndarray::{Array2, s};
use ndarray_npy::read_npy;

use crate::errors::{HicwinError, Result};
use crate::models::bin::{Bin, uniform_bins};
use crate::utils::read_lines;

/// A read-only, coordinate addressable contact map at a single resolution.
pub trait ContactSource {
    /// Bin size in base pairs.
    fn resolution(&self) -> u32;

    /// Per-bin genomic coordinates, one entry per matrix row.
    fn bins(&self) -> &[Bin];

    fn n_bins(&self) -> usize {
        self.bins().len()
    }

    /// Balanced square block `[start, end) x [start, end)`; missing values are NaN.
    fn matrix(&self, start: usize, end: usize) -> Result<Array2<f64>>;
}

///
/// A dense, fully materialized contact map.
///
#[derive(Debug, Clone)]
pub struct DenseContactMap {
    resolution: u32,
    bins: Vec<Bin>,
    matrix: Array2<f64>,
}

impl DenseContactMap {
    pub fn new(resolution: u32, bins: Vec<Bin>, matrix: Array2<f64>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(HicwinError::InvalidArgument(format!(
                "contact matrix must be square, got {}x{}",
                rows, cols
            )));
        }
        if bins.len() != rows {
            return Err(HicwinError::InvalidArgument(format!(
                "{} bins given for a matrix of side {}",
                bins.len(),
                rows
            )));
        }
        Ok(DenseContactMap {
            resolution,
            bins,
            matrix,
        })
    }

    /// Build a single chromosome map, synthesising bins from the resolution.
    pub fn from_matrix(resolution: u32, matrix: Array2<f64>) -> Result<Self> {
        let bins = uniform_bins("chr1", matrix.nrows(), resolution);
        Self::new(resolution, bins, matrix)
    }
}

impl ContactSource for DenseContactMap {
    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn bins(&self) -> &[Bin] {
        &self.bins
    }

    fn matrix(&self, start: usize, end: usize) -> Result<Array2<f64>> {
        if start > end || end > self.n_bins() {
            return Err(HicwinError::InvalidArgument(format!(
                "range {}..{} outside of a map with {} bins",
                start,
                end,
                self.n_bins()
            )));
        }
        Ok(self.matrix.slice(s![start..end, start..end]).to_owned())
    }
}

///
/// Multi-resolution directory archive of dense contact maps.
///
/// Layout: `<archive>/resolutions/<res>/matrix.npy` holds the square `f64`
/// matrix and an optional `<archive>/resolutions/<res>/bins.tsv` holds
/// `chrom start end` rows. Without `bins.tsv` a single `chr1` grid is assumed.
///
#[derive(Debug, Clone)]
pub struct DenseContactArchive {
    path: PathBuf,
}

impl DenseContactArchive {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        DenseContactArchive {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resolution_dir(&self, resolution: u32) -> PathBuf {
        self.path.join("resolutions").join(resolution.to_string())
    }

    /// Open the map stored for `resolution`.
    pub fn open(&self, resolution: u32) -> Result<DenseContactMap> {
        if !self.path.exists() {
            return Err(HicwinError::SourceMissing(self.path.clone()));
        }
        let dir = self.resolution_dir(resolution);
        let matrix_path = dir.join("matrix.npy");
        if !matrix_path.exists() {
            return Err(HicwinError::InvalidArgument(format!(
                "resolution {} is not present in archive {}",
                resolution,
                self.path.display()
            )));
        }
        let matrix: Array2<f64> = read_npy(&matrix_path)?;

        let bins_path = dir.join("bins.tsv");
        let bins = if bins_path.exists() {
            read_bins(&bins_path)?
        } else {
            uniform_bins("chr1", matrix.nrows(), resolution)
        };

        log::info!(
            "Opened contact map {} at {} bp ({} bins)",
            self.path.display(),
            resolution,
            bins.len()
        );
        DenseContactMap::new(resolution, bins, matrix)
    }
}

/// Parse a `chrom start end` table. Only the first line may be a header,
/// recognized by a `start` column that is not an integer.
pub fn read_bins(path: &Path) -> Result<Vec<Bin>> {
    let mut bins = Vec::new();
    for (i, (line_no, line)) in read_lines(path)?.into_iter().enumerate() {
        if line.starts_with('#') {
            continue;
        }
        if i == 0 && !has_integer_start(&line) {
            continue;
        }
        match parse_bin_line(&line) {
            Some(bin) => bins.push(bin),
            None => {
                return Err(HicwinError::Parse {
                    path: path.to_path_buf(),
                    line: line_no,
                    reason: "expected chrom, start and end columns".to_string(),
                });
            }
        }
    }
    Ok(bins)
}

fn has_integer_start(line: &str) -> bool {
    line.split('\t')
        .nth(1)
        .is_some_and(|start| start.trim().parse::<u64>().is_ok())
}

fn parse_bin_line(line: &str) -> Option<Bin> {
    let mut fields = line.split('\t');
    let chrom = fields.next()?;
    let start = fields.next()?.trim().parse::<u64>().ok()?;
    let end = fields.next()?.trim().parse::<u64>().ok()?;
    Some(Bin::new(chrom, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use ndarray_npy::write_npy;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    #[fixture]
    fn matrix() -> Array2<f64> {
        Array2::from_shape_fn((6, 6), |(i, j)| (i * 6 + j) as f64)
    }

    #[rstest]
    fn test_dense_map_slices_square_blocks(matrix: Array2<f64>) {
        let map = DenseContactMap::from_matrix(1000, matrix).unwrap();
        let block = map.matrix(2, 4).unwrap();
        assert_eq!(block.dim(), (2, 2));
        assert_eq!(block[[0, 0]], 14.0);
        assert_eq!(block[[1, 0]], 20.0);
        assert!(map.matrix(4, 7).is_err());
    }

    #[rstest]
    fn test_dense_map_rejects_non_square() {
        let result = DenseContactMap::from_matrix(1000, Array2::zeros((3, 4)));
        assert!(matches!(result, Err(HicwinError::InvalidArgument(_))));
    }

    #[rstest]
    fn test_archive_roundtrip_with_bins(matrix: Array2<f64>) {
        let dir = tempdir().unwrap();
        let archive = DenseContactArchive::new(dir.path().join("sample.hic"));
        let res_dir = archive.resolution_dir(5000);
        fs::create_dir_all(&res_dir).unwrap();
        write_npy(res_dir.join("matrix.npy"), &matrix).unwrap();
        let bins: String = (0..6)
            .map(|i| format!("chr3\t{}\t{}\n", i * 5000, (i + 1) * 5000))
            .collect();
        fs::write(res_dir.join("bins.tsv"), format!("chrom\tstart\tend\n{}", bins)).unwrap();

        let map = archive.open(5000).unwrap();
        assert_eq!(map.n_bins(), 6);
        assert_eq!(map.bins()[1], Bin::new("chr3", 5000, 10000));
        assert_eq!(map.matrix(0, 6).unwrap(), matrix);

        assert!(archive.open(10000).is_err());
    }

    #[rstest]
    #[case("chrom\tstart\tend\nchromosome1\t0\t100\nchromosome1\t100\t200\n")]
    #[case("chromosome1\t0\t100\nchromosome1\t100\t200\n")]
    fn test_read_bins_keeps_chrom_prefixed_names(#[case] body: &str) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bins.tsv");
        fs::write(&path, body).unwrap();

        let bins = read_bins(&path).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[1], Bin::new("chromosome1", 100, 200));
    }

    #[rstest]
    fn test_read_bins_header_only_on_first_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bins.tsv");
        fs::write(&path, "chr1\t0\t100\nchrom\tstart\tend\n").unwrap();

        let result = read_bins(&path);
        assert!(matches!(result, Err(HicwinError::Parse { line: 2, .. })));
    }

    #[rstest]
    fn test_archive_missing() {
        let dir = tempdir().unwrap();
        let archive = DenseContactArchive::new(dir.path().join("missing"));
        assert!(matches!(archive.open(1000), Err(HicwinError::SourceMissing(_))));
    }
}
