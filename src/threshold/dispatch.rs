use std::sync::Arc;

use log::{debug, trace};
use rayon::ThreadPool;
use rayon::prelude::*;

use super::worker::RowRangeWorker;
use crate::models::RowRange;

/// Splits an image into row stripes and runs them fork-join.
#[derive(Debug, Clone)]
pub struct ParallelDispatcher {
    min_parallel_samples: usize,
    stripe_samples: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl ParallelDispatcher {
    /// Dispatcher on the rayon global pool
    pub fn new(min_parallel_samples: usize, stripe_samples: usize) -> Self {
        Self {
            min_parallel_samples,
            stripe_samples: stripe_samples.max(1),
            pool: None,
        }
    }

    /// Run stripes on `pool` instead of the global pool
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Worker count stripes are spread over
    pub fn thread_count(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Disjoint, ordered ranges covering `[0, height)`.
    ///
    /// Small images yield a single range. Otherwise one stripe per
    /// `stripe_samples` samples, at most one per row, rows split evenly with
    /// the last stripe taking what is left.
    pub fn partition(&self, height: usize, total_samples: usize) -> Vec<RowRange> {
        if height == 0 {
            return Vec::new();
        }
        if total_samples < self.min_parallel_samples {
            return vec![RowRange::new(0, height)];
        }

        let stripes = total_samples.div_ceil(self.stripe_samples).clamp(1, height);
        let rows_per_stripe = height.div_ceil(stripes);

        (0..height)
            .step_by(rows_per_stripe)
            .map(|start| RowRange::new(start, (start + rows_per_stripe).min(height)))
            .collect()
    }

    /// Run `worker` over every row of the image and block until all stripes finish.
    ///
    /// `dst` must be exactly `height * row_stride` bytes. A panic in any
    /// stripe propagates to the caller once the others have stopped.
    pub fn run(&self, worker: &RowRangeWorker<'_>, src: &[u8], dst: &mut [u8], height: usize) {
        let layout = worker.layout();
        assert_eq!(
            dst.len(),
            height * layout.row_stride,
            "destination does not match image geometry"
        );

        let ranges = self.partition(height, height * layout.row_bytes);
        debug!("dispatching {} rows as {} stripes", height, ranges.len());
        match ranges.as_slice() {
            [] => {}
            [whole] => worker.run(*whole, src, dst),
            _ => {
                let band_bytes = ranges[0].len() * layout.row_stride;
                let mut job = || {
                    dst.par_chunks_mut(band_bytes)
                        .zip(ranges.par_iter())
                        .for_each(|(dst_band, rows)| {
                            trace!("stripe rows {}..{}", rows.start, rows.end);
                            let start = rows.start * layout.row_stride;
                            let end = (rows.end * layout.row_stride).min(src.len());
                            worker.run(*rows, &src[start..end], dst_band);
                        });
                };
                match &self.pool {
                    Some(pool) => pool.install(job),
                    None => job(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThresholdRange;
    use crate::threshold::simd::VectorKernel;
    use crate::threshold::table::LookupTable;
    use crate::threshold::worker::RowLayout;
    use proptest::prelude::*;

    fn assert_covers(ranges: &[RowRange], height: usize) {
        let mut next = 0;
        for r in ranges {
            assert_eq!(r.start, next);
            assert!(!r.is_empty());
            next = r.end;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn test_small_image_single_range() {
        let dispatcher = ParallelDispatcher::new(1 << 16, 1 << 16);
        assert_eq!(dispatcher.partition(10, 100), vec![RowRange::new(0, 10)]);
        assert!(dispatcher.partition(0, 0).is_empty());
    }

    #[test]
    fn test_stripe_count_follows_cost() {
        let dispatcher = ParallelDispatcher::new(0, 1000);
        let ranges = dispatcher.partition(100, 10_000);
        assert_eq!(ranges.len(), 10);
        assert_covers(&ranges, 100);

        // Never more stripes than rows
        let ranges = dispatcher.partition(3, 1_000_000);
        assert_eq!(ranges.len(), 3);
        assert_covers(&ranges, 3);
    }

    proptest! {
        #[test]
        fn test_partition_covers_rows(
            height in 1..500usize,
            row_samples in 1..4000usize,
            stripe in 1..50_000usize,
        ) {
            let dispatcher = ParallelDispatcher::new(0, stripe);
            let ranges = dispatcher.partition(height, height * row_samples);
            assert_covers(&ranges, height);
        }

        #[test]
        fn test_any_split_matches_whole(
            rows in 1..24usize,
            row_bytes in 1..70usize,
            pad in 0..5usize,
            cuts in prop::collection::vec(0..24usize, 0..6),
            seed in 0..=255u8,
            low in 0..=255u8,
            high in 0..=255u8,
        ) {
            let layout = RowLayout { row_bytes, row_stride: row_bytes + pad };
            let src: Vec<u8> = (0..rows * layout.row_stride)
                .map(|i| (i as u8).wrapping_mul(37).wrapping_add(seed))
                .collect();
            let range = ThresholdRange::new(low, high, 255);
            let table = LookupTable::new(range);
            let worker = RowRangeWorker::new(&table, range, VectorKernel::detect(), layout);

            let mut whole = vec![0u8; src.len()];
            worker.run(RowRange::new(0, rows), &src, &mut whole);

            let mut bounds: Vec<usize> = cuts.into_iter().filter(|&c| c < rows).collect();
            bounds.push(0);
            bounds.push(rows);
            bounds.sort_unstable();
            bounds.dedup();

            let mut split = vec![0u8; src.len()];
            for pair in bounds.windows(2) {
                let r = RowRange::new(pair[0], pair[1]);
                let start = r.start * layout.row_stride;
                let end = r.end * layout.row_stride;
                worker.run(r, &src[start..end], &mut split[start..end]);
            }
            prop_assert_eq!(split, whole);
        }
    }

    #[test]
    fn test_parallel_run_matches_sequential() {
        let layout = RowLayout {
            row_bytes: 301,
            row_stride: 320,
        };
        let height = 97;
        let src: Vec<u8> = (0..height * layout.row_stride).map(|i| (i % 251) as u8).collect();
        let range = ThresholdRange::new(50, 150, 255);
        let table = LookupTable::new(range);
        let worker = RowRangeWorker::new(&table, range, VectorKernel::detect(), layout);

        let mut sequential = vec![0u8; src.len()];
        ParallelDispatcher::new(usize::MAX, 1 << 16).run(&worker, &src, &mut sequential, height);

        let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap());
        let parallel = ParallelDispatcher::new(0, 1024).with_pool(pool);
        assert_eq!(parallel.thread_count(), 4);
        assert!(parallel.partition(height, height * layout.row_bytes).len() > 1);

        let mut dst = vec![0u8; src.len()];
        parallel.run(&worker, &src, &mut dst, height);
        assert_eq!(dst, sequential);
    }
}
