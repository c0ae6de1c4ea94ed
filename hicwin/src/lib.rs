//! Windowed contact-map extraction into verifiable memory-mapped storage.
//!
//! Each part lives in its own crate and is re-exported here behind a cargo
//! feature of the same name.

#[cfg(feature = "core")]
#[doc(inline)]
pub use hicwin_core as core;

#[cfg(feature = "transform")]
#[doc(inline)]
pub use hicwin_transform as transform;

#[cfg(feature = "features")]
#[doc(inline)]
pub use hicwin_features as features;

#[cfg(feature = "storage")]
#[doc(inline)]
pub use hicwin_storage as storage;
