//! Error types for range binarization.

use thiserror::Error;

use crate::models::SampleDepth;

/// Errors raised by [`crate::BinarizationEngine`] before any pixel is processed.
#[derive(Debug, Error)]
pub enum Error {
    /// Source is empty or its geometry does not describe its data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Source samples are not 8 bits wide.
    #[error("Unsupported format: {depth:?} samples, only 8-bit depth is supported")]
    UnsupportedFormat {
        /// Depth found on the rejected buffer.
        depth: SampleDepth,
    },

    /// Destination buffer could not be reserved.
    #[error("Failed to allocate {bytes} byte destination buffer")]
    AllocationFailure {
        /// Requested size in bytes (saturated on overflow).
        bytes: usize,
    },

    /// Dedicated worker pool could not be started.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
