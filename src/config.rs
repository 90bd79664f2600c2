//! Engine tuning knobs.
//!
//! Defaults can be overridden through environment variables, read once per
//! process:
//! - `RT_MIN_PARALLEL_SAMPLES`: below this many samples the image runs on the calling thread
//! - `RT_STRIPE_SAMPLES`: approximate samples per dispatched stripe
//! - `RT_THREADS`: size of a dedicated worker pool (0 = rayon global pool)
//! - `RT_DISABLE_SIMD`: non-zero forces the scalar path

use std::sync::OnceLock;

/// Default cost unit per stripe (2^16 samples).
pub const DEFAULT_STRIPE_SAMPLES: usize = 1 << 16;
/// Default minimum image size before the thread pool is involved.
pub const DEFAULT_MIN_PARALLEL_SAMPLES: usize = 1 << 16;

const MIN_STRIPE_SAMPLES: usize = 1024;

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

static MIN_PARALLEL_SAMPLES: OnceLock<usize> = OnceLock::new();

pub(crate) fn min_parallel_samples() -> usize {
    *MIN_PARALLEL_SAMPLES
        .get_or_init(|| parse_env_usize("RT_MIN_PARALLEL_SAMPLES", DEFAULT_MIN_PARALLEL_SAMPLES))
}

static STRIPE_SAMPLES: OnceLock<usize> = OnceLock::new();

pub(crate) fn stripe_samples() -> usize {
    *STRIPE_SAMPLES.get_or_init(|| {
        parse_env_usize("RT_STRIPE_SAMPLES", DEFAULT_STRIPE_SAMPLES).max(MIN_STRIPE_SAMPLES)
    })
}

static THREADS: OnceLock<usize> = OnceLock::new();

pub(crate) fn threads() -> usize {
    *THREADS.get_or_init(|| parse_env_usize("RT_THREADS", 0))
}

static DISABLE_SIMD: OnceLock<bool> = OnceLock::new();

pub(crate) fn disable_simd() -> bool {
    *DISABLE_SIMD.get_or_init(|| parse_env_bool_u8("RT_DISABLE_SIMD", false))
}

/// Configuration for [`crate::BinarizationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Images with fewer samples than this are processed as one range on the calling thread.
    pub min_parallel_samples: usize,
    /// Approximate number of samples handed to one worker.
    pub stripe_samples: usize,
    /// Dedicated pool size; 0 uses the rayon global pool.
    pub threads: usize,
    /// Allow the hardware vector kernel when the CPU supports it.
    pub vectorize: bool,
}

impl EngineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self {
            min_parallel_samples: min_parallel_samples(),
            stripe_samples: stripe_samples(),
            threads: threads(),
            vectorize: !disable_simd(),
        }
    }

    /// Set the sequential cutoff.
    pub fn with_min_parallel_samples(mut self, samples: usize) -> Self {
        self.min_parallel_samples = samples;
        self
    }

    /// Set the per-stripe sample budget (never below 1).
    pub fn with_stripe_samples(mut self, samples: usize) -> Self {
        self.stripe_samples = samples.max(1);
        self
    }

    /// Use a dedicated pool of `threads` workers (0 = global pool).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Enable or disable the vector kernel.
    pub fn with_vectorize(mut self, vectorize: bool) -> Self {
        self.vectorize = vectorize;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
