use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hicwin_core::errors::Result;
use hicwin_core::utils::write_json_atomic;

use crate::row::DiscRow;

///
/// Slot -> row mapping persisted as `index.json`. Slots are dense: `0..len()`.
///
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct StorageIndex {
    rows: BTreeMap<usize, DiscRow>,
}

impl StorageIndex {
    pub fn get(&self, slot: usize) -> Option<&DiscRow> {
        self.rows.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &DiscRow> {
        self.rows.values()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
    }
}

///
/// Mutable build state of one `generate` pass: the rows written so far and
/// the next free slot.
///
#[derive(Debug, Default)]
pub struct IndexBuilder {
    rows: BTreeMap<usize, DiscRow>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot the next accepted window goes into.
    pub fn next_slot(&self) -> usize {
        self.rows.len()
    }

    pub fn push(&mut self, row: DiscRow) {
        debug_assert_eq!(row.idx, self.next_slot());
        self.rows.insert(row.idx, row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn finish(self) -> StorageIndex {
        StorageIndex { rows: self.rows }
    }
}
