//! range_threshold - dual-threshold binarization for 8-bit images
//!
//! Every sample inside `[low, high]` becomes `fill`, every other sample
//! becomes 0. The work is split across image rows on a rayon pool; each
//! band runs a hardware vector kernel (SSE2/AVX2/NEON, detected at runtime)
//! and finishes with a table-driven scalar loop. All paths produce
//! bit-identical output.
//!
//! ```
//! use range_threshold::{binarize, PixelBuffer};
//!
//! let src = PixelBuffer::from_gray(vec![0, 128, 200, 255], 4, 1).unwrap();
//! let out = binarize(&src, 100, 200, 255).unwrap();
//! assert_eq!(out.as_bytes(), &[0, 255, 255, 0]);
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Engine tuning and environment overrides
pub mod config;
/// Top-level binarization entry point
pub mod engine;
/// Error types
pub mod error;
/// Conversions to and from `image` crate buffers
pub mod interop;
/// Core data structures (PixelBuffer, ThresholdRange, RowRange)
pub mod models;
/// Threshold kernels, row workers and parallel dispatch
#[allow(missing_docs)]
pub mod threshold;

use std::sync::OnceLock;

pub use config::EngineConfig;
pub use engine::BinarizationEngine;
pub use error::{Error, Result};
pub use models::{PixelBuffer, RowRange, SampleDepth, ThresholdRange};

static DEFAULT_ENGINE: OnceLock<BinarizationEngine> = OnceLock::new();

fn default_engine() -> &'static BinarizationEngine {
    DEFAULT_ENGINE.get_or_init(BinarizationEngine::new)
}

/// Threshold `source` with a shared default engine
///
/// # Arguments
/// * `source` - 8-bit image, any channel count and row stride
/// * `low`, `high` - inclusive band; `low > high` selects nothing
/// * `fill` - value written for samples inside the band
///
/// # Returns
/// A new buffer with the same geometry as `source`
pub fn binarize(source: &PixelBuffer, low: u8, high: u8, fill: u8) -> Result<PixelBuffer> {
    default_engine().binarize(source, low, high, fill)
}

/// Threshold with floating-point parameters saturated into 0..=255
pub fn binarize_f64(source: &PixelBuffer, low: f64, high: f64, fill: f64) -> Result<PixelBuffer> {
    default_engine().binarize_f64(source, low, high, fill)
}
