use std::sync::Arc;

use log::{debug, warn};
use rayon::ThreadPool;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::{PixelBuffer, SampleDepth, ThresholdRange};
use crate::threshold::{LookupTable, ParallelDispatcher, RowLayout, RowRangeWorker, VectorKernel};

/// Validates input, builds the table and drives the row workers.
///
/// The engine holds no per-image state; one instance can serve any number
/// of calls, from any thread.
#[derive(Debug, Clone)]
pub struct BinarizationEngine {
    config: EngineConfig,
    vector: Option<VectorKernel>,
    dispatcher: ParallelDispatcher,
}

impl BinarizationEngine {
    /// Engine with [`EngineConfig::default`].
    ///
    /// Falls back to the rayon global pool if a configured dedicated pool
    /// cannot be started.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let pool = match build_pool(config.threads) {
            Ok(pool) => pool,
            Err(e) => {
                warn!("{}; using the global pool", e);
                None
            }
        };
        Self::assemble(config, pool)
    }

    /// Engine with explicit tuning
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let pool = build_pool(config.threads)?;
        Ok(Self::assemble(config, pool))
    }

    fn assemble(config: EngineConfig, pool: Option<Arc<ThreadPool>>) -> Self {
        let vector = if config.vectorize {
            VectorKernel::detect()
        } else {
            None
        };

        let mut dispatcher =
            ParallelDispatcher::new(config.min_parallel_samples, config.stripe_samples);
        if let Some(pool) = pool {
            dispatcher = dispatcher.with_pool(pool);
        }

        debug!(
            "threshold engine: vector kernel {}, {} worker threads",
            vector.map_or("none", |k| k.name()),
            dispatcher.thread_count()
        );

        Self {
            config,
            vector,
            dispatcher,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Vector kernel in use, if any
    pub fn vector_kernel(&self) -> Option<VectorKernel> {
        self.vector
    }

    /// Keep samples in `[low, high]` as `fill`, zero everything else.
    ///
    /// Returns a new buffer with the same geometry; `source` is not modified.
    pub fn binarize(&self, source: &PixelBuffer, low: u8, high: u8, fill: u8) -> Result<PixelBuffer> {
        self.binarize_range(source, ThresholdRange::new(low, high, fill))
    }

    /// [`binarize`](Self::binarize) with floating-point parameters saturated
    /// into the 8-bit domain (see [`ThresholdRange::saturating`]).
    pub fn binarize_f64(
        &self,
        source: &PixelBuffer,
        low: f64,
        high: f64,
        fill: f64,
    ) -> Result<PixelBuffer> {
        self.binarize_range(source, ThresholdRange::saturating(low, high, fill))
    }

    /// [`binarize`](Self::binarize) with a prepared range
    pub fn binarize_range(&self, source: &PixelBuffer, range: ThresholdRange) -> Result<PixelBuffer> {
        validate_source(source)?;
        let mut dest = source.zeroed_like()?;
        self.run(source, &mut dest, range);
        Ok(dest)
    }

    /// Threshold into a caller-provided buffer of identical geometry.
    ///
    /// Stride padding in `dest` is left as it was.
    pub fn binarize_into(
        &self,
        source: &PixelBuffer,
        dest: &mut PixelBuffer,
        range: ThresholdRange,
    ) -> Result<()> {
        validate_source(source)?;
        if !source.same_geometry(dest) {
            return Err(Error::InvalidInput(format!(
                "destination geometry {}x{}x{} stride {} does not match source {}x{}x{} stride {}",
                dest.width(),
                dest.height(),
                dest.channels(),
                dest.row_stride(),
                source.width(),
                source.height(),
                source.channels(),
                source.row_stride()
            )));
        }
        let full = dest.height() * dest.row_stride();
        if dest.as_bytes().len() != full {
            return Err(Error::InvalidInput(format!(
                "destination must hold {} bytes including final row padding, has {}",
                full,
                dest.as_bytes().len()
            )));
        }

        self.run(source, dest, range);
        Ok(())
    }

    fn run(&self, source: &PixelBuffer, dest: &mut PixelBuffer, range: ThresholdRange) {
        let table = LookupTable::new(range);
        let layout = RowLayout {
            row_bytes: source.row_bytes(),
            row_stride: source.row_stride(),
        };
        let worker = RowRangeWorker::new(&table, range, self.vector, layout);

        debug!(
            "binarize {}x{}x{} stride {} band [{}, {}] fill {}",
            source.width(),
            source.height(),
            source.channels(),
            source.row_stride(),
            range.low,
            range.high,
            range.fill
        );

        self.dispatcher
            .run(&worker, source.as_bytes(), dest.as_bytes_mut(), source.height());
    }
}

impl Default for BinarizationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn build_pool(threads: usize) -> Result<Option<Arc<ThreadPool>>> {
    if threads == 0 {
        return Ok(None);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("range-threshold-{}", i))
        .build()?;
    Ok(Some(Arc::new(pool)))
}

fn validate_source(source: &PixelBuffer) -> Result<()> {
    if source.sample_count() == 0 {
        return Err(Error::InvalidInput("source image is empty".to_string()));
    }
    if source.depth() != SampleDepth::U8 {
        return Err(Error::UnsupportedFormat {
            depth: source.depth(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_engine() -> BinarizationEngine {
        BinarizationEngine::with_config(EngineConfig::default().with_vectorize(false)).unwrap()
    }

    #[test]
    fn test_band_scenario() {
        let src = PixelBuffer::from_gray(vec![0, 128, 200, 255], 4, 1).unwrap();
        let out = BinarizationEngine::new().binarize(&src, 100, 200, 255).unwrap();
        assert_eq!(out.as_bytes(), &[0, 255, 255, 0]);
        assert_eq!(src.as_bytes(), &[0, 128, 200, 255]);
    }

    #[test]
    fn test_vector_disabled() {
        let engine = scalar_engine();
        assert!(engine.vector_kernel().is_none());
        let src = PixelBuffer::from_gray((0..64).collect(), 8, 8).unwrap();
        let out = engine.binarize(&src, 10, 20, 1).unwrap();
        for (s, o) in src.as_bytes().iter().zip(out.as_bytes()) {
            assert_eq!(*o, u8::from((10..=20).contains(s)));
        }
    }

    #[test]
    fn test_rejects_wide_samples() {
        let src = PixelBuffer::new(2, 2, 1, SampleDepth::U16, 4, vec![0; 8]).unwrap();
        let err = BinarizationEngine::new().binarize(&src, 0, 255, 255).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { depth: SampleDepth::U16 }));
    }

    #[test]
    fn test_float_parameters_saturate() {
        let src = PixelBuffer::from_gray(vec![0, 99, 100, 255], 4, 1).unwrap();
        let out = BinarizationEngine::new()
            .binarize_f64(&src, 99.7, 1e9, 300.0)
            .unwrap();
        assert_eq!(out.as_bytes(), &[0, 255, 255, 255]);
    }

    #[test]
    fn test_binarize_into_checks_geometry() {
        let engine = scalar_engine();
        let src = PixelBuffer::from_gray(vec![5; 6], 3, 2).unwrap();
        let mut wrong = PixelBuffer::from_gray(vec![0; 6], 2, 3).unwrap();
        let err = engine
            .binarize_into(&src, &mut wrong, ThresholdRange::gray(0, 10))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let mut dest = src.zeroed_like().unwrap();
        engine
            .binarize_into(&src, &mut dest, ThresholdRange::gray(0, 10))
            .unwrap();
        assert_eq!(dest.as_bytes(), &[255; 6]);
    }

    #[test]
    fn test_binarize_into_requires_final_padding() {
        let engine = scalar_engine();
        let src = PixelBuffer::new(2, 2, 1, SampleDepth::U8, 3, vec![1; 5]).unwrap();
        let mut short = PixelBuffer::new(2, 2, 1, SampleDepth::U8, 3, vec![0; 5]).unwrap();
        assert!(matches!(
            engine.binarize_into(&src, &mut short, ThresholdRange::gray(0, 1)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_dedicated_pool() {
        let config = EngineConfig::default()
            .with_threads(2)
            .with_min_parallel_samples(0)
            .with_stripe_samples(64);
        let engine = BinarizationEngine::with_config(config).unwrap();
        let src = PixelBuffer::from_gray((0..64 * 64).map(|i| i as u8).collect(), 64, 64).unwrap();
        let out = engine.binarize(&src, 64, 127, 255).unwrap();
        let reference = scalar_engine().binarize(&src, 64, 127, 255).unwrap();
        assert_eq!(out, reference);
    }
}
