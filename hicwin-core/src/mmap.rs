//! Memory-mapped flat `f64` arrays addressed by row.
//!
//! A backing file is a raw, headerless, row-major block of little-endian
//! 8-byte floats of shape `(rows, row_len)`. Every row can be fingerprinted
//! with SHA-256 over exactly the bytes stored for that row.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use memmap2::{Mmap, MmapMut};

use crate::errors::{HicwinError, Result};
use crate::utils::sha256_hex;

const ITEM_SIZE: usize = std::mem::size_of::<f64>();

enum Backing {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

/// A fixed-shape flat array of rows backed by a memory-mapped file.
pub struct MmapArray {
    path: PathBuf,
    rows: usize,
    row_len: usize,
    _file: File,
    backing: Backing,
}

impl MmapArray {
    ///
    /// Create a zero-filled array file of shape `(rows, row_len)`.
    ///
    /// Fails with [`HicwinError::AlreadyExists`] if the file exists and
    /// `overwrite` is false; with `overwrite` the old file is removed first.
    ///
    pub fn create<P: AsRef<Path>>(
        path: P,
        rows: usize,
        row_len: usize,
        overwrite: bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        let n_bytes = rows * row_len * ITEM_SIZE;
        if n_bytes == 0 {
            return Err(HicwinError::InvalidArgument(format!(
                "cannot allocate an empty array of shape ({}, {})",
                rows, row_len
            )));
        }
        if path.exists() {
            if !overwrite {
                return Err(HicwinError::AlreadyExists(path.to_path_buf()));
            }
            std::fs::remove_file(path)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.set_len(n_bytes as u64)?;

        // SAFETY: the file is held open for the lifetime of the mapping and a
        // single writer owns it while a build is running.
        let mmap = unsafe { MmapMut::map_mut(&file) }?;

        Ok(MmapArray {
            path: path.to_path_buf(),
            rows,
            row_len,
            _file: file,
            backing: Backing::ReadWrite(mmap),
        })
    }

    ///
    /// Reattach to an existing array file; its size must match the shape exactly.
    ///
    pub fn open<P: AsRef<Path>>(
        path: P,
        rows: usize,
        row_len: usize,
        writable: bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(writable).open(path)?;

        let expected = (rows * row_len * ITEM_SIZE) as u64;
        let actual = file.metadata()?.len();
        if actual != expected {
            return Err(HicwinError::InvalidArgument(format!(
                "{} holds {} bytes but shape ({}, {}) needs {}",
                path.display(),
                actual,
                rows,
                row_len,
                expected
            )));
        }

        // SAFETY: see `create`; readers must only attach after the build flushed.
        let backing = if writable {
            Backing::ReadWrite(unsafe { MmapMut::map_mut(&file) }?)
        } else {
            Backing::ReadOnly(unsafe { Mmap::map(&file) }?)
        };

        Ok(MmapArray {
            path: path.to_path_buf(),
            rows,
            row_len,
            _file: file,
            backing,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn row_len(&self) -> usize {
        self.row_len
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.backing, Backing::ReadWrite(_))
    }

    fn bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::ReadOnly(m) => &m[..],
            Backing::ReadWrite(m) => &m[..],
        }
    }

    fn row_range(&self, slot: usize) -> Result<std::ops::Range<usize>> {
        if slot >= self.rows {
            return Err(HicwinError::InvalidArgument(format!(
                "slot {} out of range for {} with {} rows",
                slot,
                self.path.display(),
                self.rows
            )));
        }
        let width = self.row_len * ITEM_SIZE;
        Ok(slot * width..(slot + 1) * width)
    }

    /// Raw stored bytes of one row.
    pub fn row_bytes(&self, slot: usize) -> Result<&[u8]> {
        let range = self.row_range(slot)?;
        Ok(&self.bytes()[range])
    }

    /// Decoded values of one row.
    pub fn row(&self, slot: usize) -> Result<Vec<f64>> {
        let bytes = self.row_bytes(slot)?;
        let mut values = vec![0.0; self.row_len];
        LittleEndian::read_f64_into(bytes, &mut values);
        Ok(values)
    }

    /// SHA-256 of the bytes currently stored at `slot`.
    pub fn digest(&self, slot: usize) -> Result<String> {
        Ok(sha256_hex(self.row_bytes(slot)?))
    }

    ///
    /// Write one row and return the digest of the bytes as stored.
    ///
    pub fn write_row(&mut self, slot: usize, values: &[f64]) -> Result<String> {
        if values.len() != self.row_len {
            return Err(HicwinError::InvalidArgument(format!(
                "row of length {} written to {} with rows of length {}",
                values.len(),
                self.path.display(),
                self.row_len
            )));
        }
        let range = self.row_range(slot)?;
        match &mut self.backing {
            Backing::ReadWrite(m) => {
                LittleEndian::write_f64_into(values, &mut m[range.clone()]);
                Ok(sha256_hex(&m[range]))
            }
            Backing::ReadOnly(_) => Err(HicwinError::InvalidArgument(format!(
                "{} is attached read-only",
                self.path.display()
            ))),
        }
    }

    /// Decoded values of the first `n_rows` rows, concatenated.
    pub fn prefix(&self, n_rows: usize) -> Result<Vec<f64>> {
        if n_rows > self.rows {
            return Err(HicwinError::InvalidArgument(format!(
                "prefix of {} rows requested from {} rows",
                n_rows, self.rows
            )));
        }
        let bytes = &self.bytes()[..n_rows * self.row_len * ITEM_SIZE];
        let mut values = vec![0.0; n_rows * self.row_len];
        LittleEndian::read_f64_into(bytes, &mut values);
        Ok(values)
    }

    /// Flush pending writes to disk. A no-op for read-only arrays.
    pub fn flush(&self) -> Result<()> {
        if let Backing::ReadWrite(m) = &self.backing {
            m.flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MmapArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapArray")
            .field("path", &self.path)
            .field("rows", &self.rows)
            .field("row_len", &self.row_len)
            .field("writable", &self.is_writable())
            .finish()
    }
}
