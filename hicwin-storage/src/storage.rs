use std::collections::HashSet;
use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use hicwin_core::consts::{INDEX_FILE, MAPS_FILE, META_FILE, TMP_DIR};
use hicwin_core::errors::{HicwinError, Result};
use hicwin_core::mmap::MmapArray;
use hicwin_core::models::{Bin, ContactSource};
use hicwin_core::utils::remove_if_exists;
use hicwin_features::feature::{array_file, track_file};
use hicwin_features::{Feature, FeatureTrack, NormKind};
use hicwin_transform::{WindowTransform, WindowVerdict};

use crate::index::{IndexBuilder, StorageIndex};
use crate::meta::{FeatureEntry, StorageMeta};
use crate::row::{DiscRow, RESERVED_FIELDS, StoredWindow};

/// Lifecycle of a [`DiscStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageState {
    /// Directory checked, metadata read if present; no arrays open.
    Uninitialized,
    /// A `generate` pass completed on this object.
    Built,
    /// Arrays reopened read-only by `load`.
    Attached,
}

/// Genomic extent of a stored window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicSpan {
    pub chrom: String,
    pub start: u64,
    pub end_chrom: String,
    pub end: u64,
}

impl Display for GenomicSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.chrom == self.end_chrom {
            write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
        } else {
            write!(f, "{}:{}-{}:{}", self.chrom, self.start, self.end_chrom, self.end)
        }
    }
}

/// Number of window-grid positions for a map of `n_bins` bins.
pub fn grid_capacity(n_bins: usize, window_size: usize) -> usize {
    if window_size == 0 {
        return 0;
    }
    n_bins / window_size * 2
}

/// Bin range `[left, right)` of window-grid position `idx`.
pub fn window_bounds(idx: usize, window_size: usize) -> (usize, usize) {
    let left = window_size * idx / 2;
    (left, left + window_size)
}

///
/// Windowed contact-map store rooted at a directory.
///
/// Single writer: `generate` must complete before any other process calls
/// `load` on the same directory. Nothing here locks the files.
///
#[derive(Debug)]
pub struct DiscStorage {
    root: PathBuf,
    source_name: String,
    meta: Option<StorageMeta>,
    index: Option<StorageIndex>,
    maps: Option<MmapArray>,
    features: Vec<FeatureTrack>,
    state: StorageState,
    progress: bool,
}

impl DiscStorage {
    ///
    /// Open a storage directory.
    ///
    /// # Arguments
    /// - root: storage directory; must exist
    /// - source_name: contact-map archive inside `root`; must exist
    /// - force_rewrite: delete every file of a previous build
    ///
    pub fn new<P: AsRef<Path>>(root: P, source_name: &str, force_rewrite: bool) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(HicwinError::StorageDirMissing(root));
        }
        let source_path = root.join(source_name);
        if !source_path.exists() {
            return Err(HicwinError::SourceMissing(source_path));
        }
        let tmp = root.join(TMP_DIR);
        if !tmp.exists() {
            fs::create_dir(&tmp)?;
        }

        let mut storage = DiscStorage {
            root,
            source_name: source_name.to_string(),
            meta: None,
            index: None,
            maps: None,
            features: Vec::new(),
            state: StorageState::Uninitialized,
            progress: true,
        };
        if force_rewrite {
            storage.clear()?;
        }

        let meta_path = storage.root.join(META_FILE);
        if meta_path.exists() {
            storage.meta = Some(StorageMeta::from_file(&meta_path)?);
        }
        Ok(storage)
    }

    /// Open an existing build and attach to it, taking the archive name from its metadata.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(HicwinError::StorageDirMissing(root.to_path_buf()));
        }
        let meta = StorageMeta::from_file(&root.join(META_FILE))?;
        let mut storage = Self::new(root, &meta.cooler, false)?;
        storage.load()?;
        Ok(storage)
    }

    /// Show or hide the progress bar of `generate`.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> StorageState {
        self.state
    }

    pub fn meta(&self) -> Option<&StorageMeta> {
        self.meta.as_ref()
    }

    pub fn features(&self) -> &[FeatureTrack] {
        &self.features
    }

    /// Number of stored windows.
    pub fn size(&self) -> usize {
        self.meta.as_ref().map(|m| m.length).unwrap_or(0)
    }

    ///
    /// Delete every file a previous build left behind: metadata, index, map
    /// array and each recorded feature's array and track.
    ///
    fn clear(&mut self) -> Result<()> {
        self.maps = None;
        self.features.clear();
        self.index = None;

        let meta_path = self.root.join(META_FILE);
        let previous = match self.meta.take() {
            Some(meta) => Some(meta),
            None if meta_path.exists() => match StorageMeta::from_file(&meta_path) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!("Ignoring unreadable {}: {}", meta_path.display(), e);
                    None
                }
            },
            None => None,
        };

        let mut targets = vec![
            meta_path,
            self.root.join(INDEX_FILE),
            self.root.join(MAPS_FILE),
        ];
        if let Some(meta) = previous {
            targets.push(self.root.join(&meta.maps));
            for entry in &meta.features {
                targets.push(self.root.join(&entry.descriptor.path));
                targets.push(self.root.join(&entry.descriptor.track));
            }
        }
        for target in targets {
            if remove_if_exists(&target)? {
                warn!("Removed {}", target.display());
            }
        }

        self.state = StorageState::Uninitialized;
        Ok(())
    }

    fn check_features(&self, features: &[Box<dyn Feature>], n_bins: usize) -> Result<()> {
        let mut seen = HashSet::new();
        for feature in features {
            let name = feature.name();
            if RESERVED_FIELDS.contains(&name) {
                return Err(HicwinError::InvalidArgument(format!(
                    "'{}' is reserved and cannot name a feature",
                    name
                )));
            }
            if !seen.insert(name) {
                return Err(HicwinError::InvalidArgument(format!(
                    "feature '{}' given more than once",
                    name
                )));
            }
            if feature.track().len() < n_bins {
                return Err(HicwinError::InvalidArgument(format!(
                    "feature '{}' covers {} bins but the contact map has {}",
                    name,
                    feature.track().len(),
                    n_bins
                )));
            }
        }
        Ok(())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        bar
    }

    ///
    /// Sweep the window grid over `source`, transform every window, store the
    /// accepted ones with their feature slices and persist index and metadata.
    ///
    /// # Arguments
    /// - source: contact map to cut windows from; its resolution is recorded
    /// - window_size: bins per window side
    /// - features: auxiliary tracks stored alongside each window
    /// - force_rewrite: replace an existing build instead of failing
    ///
    pub fn generate(
        &mut self,
        source: &dyn ContactSource,
        window_size: usize,
        features: Vec<Box<dyn Feature>>,
        force_rewrite: bool,
    ) -> Result<()> {
        if window_size == 0 {
            return Err(HicwinError::InvalidArgument(
                "window size must be positive".to_string(),
            ));
        }
        let n_bins = source.n_bins();
        self.check_features(&features, n_bins)?;

        if force_rewrite {
            self.clear()?;
        } else {
            // refuse before anything is allocated
            let mut targets = vec![self.root.join(MAPS_FILE)];
            for feature in &features {
                targets.push(self.root.join(array_file(feature.name())));
                targets.push(self.root.join(track_file(feature.name())));
            }
            if let Some(existing) = targets.into_iter().find(|p| p.exists()) {
                return Err(HicwinError::AlreadyExists(existing));
            }
        }

        let capacity = grid_capacity(n_bins, window_size);
        info!(
            "Start processing {}: {} bins at {}bp, {} window positions",
            self.source_name,
            n_bins,
            source.resolution(),
            capacity
        );

        let mut maps = MmapArray::create(
            self.root.join(MAPS_FILE),
            capacity,
            window_size * window_size,
            force_rewrite,
        )?;
        let mut tracks: Vec<FeatureTrack> = features.into_iter().map(FeatureTrack::new).collect();
        for track in tracks.iter_mut() {
            track.allocate_storage(&self.root, window_size, capacity, force_rewrite)?;
        }

        let transform = WindowTransform::new(window_size);
        let last = capacity.saturating_sub(3);
        let bar = self.progress_bar(last.saturating_sub(2));
        let mut builder = IndexBuilder::new();

        for idx in 2..last {
            let (left, right) = window_bounds(idx, window_size);
            let block = source.matrix(left - window_size, right + window_size)?;

            match transform.apply(&block)? {
                WindowVerdict::Rejected { reason, .. } => {
                    debug!("Window {} ({}..{}) rejected: {:?}", idx, left, right, reason);
                }
                WindowVerdict::Accepted(window) => {
                    let slot = builder.next_slot();
                    let values: Vec<f64> = window.iter().copied().collect();
                    let mut row = DiscRow::new(slot, left, right, maps.write_row(slot, &values)?);
                    for track in tracks.iter_mut() {
                        let digest = track.persist_window(left, right, slot)?;
                        row.set_feature(track.name(), digest);
                    }
                    builder.push(row);
                    bar.set_message(format!("{} stored", builder.len()));
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        let length = builder.len();
        maps.flush()?;
        let mut entries = Vec::with_capacity(tracks.len());
        for track in tracks.iter_mut() {
            track.flush()?;
            let stats = track.finalize_statistics(length)?;
            track.persist_track(&self.root)?;
            entries.push(FeatureEntry {
                descriptor: track.descriptor(),
                shape: [capacity, window_size],
                stats,
            });
        }

        let meta = StorageMeta {
            resolution: source.resolution(),
            window_size,
            length,
            memmap_shape: [capacity, window_size, window_size],
            features: entries,
            maps: MAPS_FILE.to_string(),
            cooler: self.source_name.clone(),
        };
        let index = builder.finish();
        index.write(&self.root.join(INDEX_FILE))?;
        meta.write(&self.root.join(META_FILE))?;
        info!(
            "Stored {} of {} windows from {}",
            length,
            last.saturating_sub(2),
            self.source_name
        );

        self.meta = Some(meta);
        self.index = Some(index);
        self.maps = Some(maps);
        self.features = tracks;
        self.state = StorageState::Built;
        Ok(())
    }

    ///
    /// Reattach to a previous build without recomputing anything. Arrays are
    /// opened read-only with the shapes recorded in the metadata.
    ///
    /// There is no writable reattach: only `generate` writes rows, into
    /// freshly allocated arrays.
    ///
    pub fn load(&mut self) -> Result<()> {
        let meta_path = self.root.join(META_FILE);
        if !meta_path.exists() {
            return Err(HicwinError::InvalidArgument(format!(
                "no build found in {}",
                self.root.display()
            )));
        }
        // release the writer's maps before reopening
        self.maps = None;
        self.features.clear();

        let meta = StorageMeta::from_file(&meta_path)?;
        if meta.cooler != self.source_name {
            warn!(
                "Storage was built from {}, opened for {}",
                meta.cooler, self.source_name
            );
        }
        let index = StorageIndex::from_file(&self.root.join(INDEX_FILE))?;
        if index.len() != meta.length {
            return Err(HicwinError::Corruption {
                slot: index.len().min(meta.length),
                target: "index".to_string(),
            });
        }

        let ws = meta.window_size;
        let maps = MmapArray::open(self.root.join(&meta.maps), meta.capacity(), ws * ws, false)?;
        let mut tracks = Vec::with_capacity(meta.features.len());
        for entry in &meta.features {
            let mut track = FeatureTrack::new(entry.descriptor.restore(&self.root)?);
            track.attach(&self.root, entry.shape[1], entry.shape[0], false)?;
            track.set_stats(entry.stats);
            tracks.push(track);
        }
        info!(
            "Attached {} windows ({} features) from {}",
            meta.length,
            tracks.len(),
            self.root.display()
        );

        self.meta = Some(meta);
        self.index = Some(index);
        self.maps = Some(maps);
        self.features = tracks;
        self.state = StorageState::Attached;
        Ok(())
    }

    fn not_loaded(&self) -> HicwinError {
        HicwinError::InvalidArgument(format!(
            "storage in {} is neither built nor loaded",
            self.root.display()
        ))
    }

    /// Row descriptor of `slot`, without integrity checks or array access.
    pub fn raw(&self, slot: usize) -> Result<&DiscRow> {
        let index = self.index.as_ref().ok_or_else(|| self.not_loaded())?;
        index.get(slot).ok_or_else(|| {
            HicwinError::InvalidArgument(format!(
                "slot {} out of range for {} stored windows",
                slot,
                index.len()
            ))
        })
    }

    /// Verified window at `slot` with every stored feature.
    pub fn get(&self, slot: usize, norm: NormKind) -> Result<StoredWindow> {
        let names: Vec<&str> = self.features.iter().map(|f| f.name()).collect();
        self.get_with(slot, norm, &names)
    }

    ///
    /// Verified window at `slot`, restricted to the named features.
    ///
    pub fn get_with(&self, slot: usize, norm: NormKind, names: &[&str]) -> Result<StoredWindow> {
        let row = self.raw(slot)?;
        let (maps, meta) = match (&self.maps, &self.meta) {
            (Some(maps), Some(meta)) => (maps, meta),
            _ => return Err(self.not_loaded()),
        };
        let selected = names
            .iter()
            .map(|name| {
                self.features
                    .iter()
                    .find(|f| f.name() == *name)
                    .ok_or_else(|| HicwinError::UnknownFeature(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        row.verify_and_load(slot, maps, meta.window_size, &selected, norm)
    }

    /// Verify every stored slot, failing on the first mismatch.
    pub fn verify_all(&self) -> Result<()> {
        for slot in 0..self.size() {
            self.get(slot, NormKind::None)?;
        }
        Ok(())
    }

    /// Slots whose row satisfies `pred`, in ascending order.
    pub fn select<F>(&self, pred: F) -> Vec<usize>
    where
        F: Fn(&DiscRow) -> bool,
    {
        match &self.index {
            Some(index) => index.rows().filter(|r| pred(r)).map(|r| r.idx).collect(),
            None => Vec::new(),
        }
    }

    ///
    /// Genomic coordinates covered by the window at `slot`.
    ///
    /// # Arguments
    /// - slot: stored window
    /// - bins: bin grid of the contact map the storage was built from
    ///
    pub fn locate(&self, slot: usize, bins: &[Bin]) -> Result<GenomicSpan> {
        let row = self.raw(slot)?;
        let first = bins.get(row.start_position);
        let last = row.end_position.checked_sub(1).and_then(|i| bins.get(i));
        match (first, last) {
            (Some(first), Some(last)) => Ok(GenomicSpan {
                chrom: first.chrom.clone(),
                start: first.start,
                end_chrom: last.chrom.clone(),
                end: last.end,
            }),
            _ => Err(HicwinError::InvalidArgument(format!(
                "window {}..{} lies outside a grid of {} bins",
                row.start_position,
                row.end_position,
                bins.len()
            ))),
        }
    }
}
