//! Delimited text tables and bin-aligned tracks.
//!
//! External feature sources are tab separated tables (optionally gzip'd) with
//! `chrom`, `start`, `end` and one or more value columns. They are turned into
//! a [`Track`]: one value per bin, aligned with the contact-map bin grid.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use hicwin_core::errors::{HicwinError, Result};
use hicwin_core::models::Bin;
use hicwin_core::models::bin::bin_key;
use hicwin_core::utils::{parse_value, read_lines};
use hicwin_transform::interp_nan_inplace;

///
/// A parsed delimited text table.
///
#[derive(Debug, Clone)]
pub struct DelimitedTable {
    pub path: PathBuf,
    pub header: Option<Vec<String>>,
    /// `(line number, cells)` per data row
    pub rows: Vec<(usize, Vec<String>)>,
}

impl DelimitedTable {
    ///
    /// Read a tab separated table.
    ///
    /// # Arguments
    /// - path: the file to read (`.gz` is decompressed transparently)
    /// - has_header: whether the first non-empty line holds column names
    ///
    pub fn read(path: &Path, has_header: bool) -> Result<Self> {
        let mut lines = read_lines(path)?.into_iter();
        let header: Option<Vec<String>> = if has_header {
            lines
                .next()
                .map(|(_, line)| line.split('\t').map(|c| c.trim().to_string()).collect())
        } else {
            None
        };
        let rows = lines
            .map(|(line_no, line)| {
                let cells = line.split('\t').map(|c| c.trim().to_string()).collect();
                (line_no, cells)
            })
            .collect();

        Ok(DelimitedTable {
            path: path.to_path_buf(),
            header,
            rows,
        })
    }

    /// Index of a named column.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.header
            .as_ref()
            .and_then(|h| h.iter().position(|c| c == name))
            .ok_or_else(|| {
                HicwinError::InvalidArgument(format!(
                    "column '{}' not found in {}",
                    name,
                    self.path.display()
                ))
            })
    }

    fn parse_error(&self, line: usize, reason: String) -> HicwinError {
        HicwinError::Parse {
            path: self.path.clone(),
            line,
            reason,
        }
    }

    fn cell<'a>(&self, line: usize, cells: &'a [String], col: usize) -> Result<&'a str> {
        cells
            .get(col)
            .map(|c| c.as_str())
            .ok_or_else(|| self.parse_error(line, format!("missing column {}", col)))
    }

    ///
    /// Extract `(bin, value)` pairs from the given columns.
    ///
    /// Missing cells (`NA`, `nan`, empty) become NaN; anything else that fails
    /// to parse is an error.
    ///
    pub fn records(
        &self,
        chrom_col: usize,
        start_col: usize,
        end_col: usize,
        value_col: usize,
    ) -> Result<Vec<(Bin, f64)>> {
        let mut out = Vec::with_capacity(self.rows.len());
        for (line, cells) in &self.rows {
            let chrom = self.cell(*line, cells, chrom_col)?;
            let start = self
                .cell(*line, cells, start_col)?
                .parse::<u64>()
                .map_err(|e| self.parse_error(*line, format!("bad start: {}", e)))?;
            let end = self
                .cell(*line, cells, end_col)?
                .parse::<u64>()
                .map_err(|e| self.parse_error(*line, format!("bad end: {}", e)))?;
            let raw = self.cell(*line, cells, value_col)?;
            let value = parse_value(raw)
                .ok_or_else(|| self.parse_error(*line, format!("bad value: {}", raw)))?;
            out.push((Bin::new(chrom, start, end), value));
        }
        Ok(out)
    }
}

///
/// One value per bin, aligned with a bin grid.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub bins: Vec<Bin>,
    pub values: Vec<f64>,
}

impl Track {
    pub fn new(bins: Vec<Bin>, values: Vec<f64>) -> Result<Self> {
        if bins.len() != values.len() {
            return Err(HicwinError::InvalidArgument(format!(
                "track has {} bins but {} values",
                bins.len(),
                values.len()
            )));
        }
        Ok(Track { bins, values })
    }

    /// Track taken positionally from table records.
    pub fn from_records(records: Vec<(Bin, f64)>) -> Self {
        let (bins, values) = records.into_iter().unzip();
        Track { bins, values }
    }

    ///
    /// Left join records onto `bins` by `chrom:start` key; bins without a
    /// matching record get NaN.
    ///
    pub fn join_onto(bins: &[Bin], records: &[(Bin, f64)]) -> Self {
        let lookup: HashMap<String, f64> = records
            .iter()
            .map(|(bin, value)| (bin_key(&bin.chrom, bin.start), *value))
            .collect();
        let values = bins
            .iter()
            .map(|bin| lookup.get(&bin.key()).copied().unwrap_or(f64::NAN))
            .collect();
        Track {
            bins: bins.to_vec(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fill missing values in place.
    pub fn interpolate(mut self) -> Result<Self> {
        interp_nan_inplace(&mut self.values)?;
        Ok(self)
    }

    /// Values for bins `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        if start > end || end > self.values.len() {
            return Err(HicwinError::InvalidArgument(format!(
                "range {}..{} outside of a track with {} bins",
                start,
                end,
                self.values.len()
            )));
        }
        Ok(self.values[start..end].to_vec())
    }

    /// Persist as `chrom start end value`.
    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for (bin, value) in self.bins.iter().zip(&self.values) {
            writeln!(writer, "{}\t{}", bin, value)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reload a track written by [`Track::write_tsv`].
    pub fn read_tsv(path: &Path) -> Result<Self> {
        let table = DelimitedTable::read(path, false)?;
        Ok(Track::from_records(table.records(0, 1, 2, 3)?))
    }
}
