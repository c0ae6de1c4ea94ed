pub mod bin;
pub mod contact;

// re-export for cleaner imports
pub use self::bin::Bin;
pub use self::contact::{ContactSource, DenseContactArchive, DenseContactMap};
