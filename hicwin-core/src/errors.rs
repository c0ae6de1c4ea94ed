use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy shared by every hicwin crate.
#[derive(Error, Debug)]
pub enum HicwinError {
    #[error("Storage directory does not exist: {0}")]
    StorageDirMissing(PathBuf),

    #[error("Contact map archive does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("File {0} already exists")]
    AlreadyExists(PathBuf),

    /// A recorded digest does not match the bytes currently stored.
    #[error("Storage corruption at slot {slot}: {target} digest mismatch")]
    Corruption { slot: usize, target: String },

    #[error("No such feature: {0}")]
    UnknownFeature(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Error parsing {path} at line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Npy(#[from] ndarray_npy::ReadNpyError),
}

pub type Result<T> = std::result::Result<T, HicwinError>;
