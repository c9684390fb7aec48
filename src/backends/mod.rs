//! Inference backend implementations

#[cfg(feature = "tract")]
pub mod tract;

pub mod test_utils;

#[cfg(feature = "tract")]
pub use tract::TractBackend;

pub use test_utils::MockBackend;
