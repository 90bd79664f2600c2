//! Band-pass threshold kernels
//!
//! - `table`: 256-entry classification table
//! - `scalar`: table-driven row kernel, unrolled by four
//! - `simd`: SSE2/AVX2/NEON range-test-and-mask kernel
//! - `worker`: thresholds one band of rows (vector pass, then scalar tail)
//! - `dispatch`: row partitioning and fork-join execution on rayon

pub mod dispatch;
pub mod scalar;
pub mod simd;
pub mod table;
pub mod worker;

pub use dispatch::ParallelDispatcher;
pub use simd::VectorKernel;
pub use table::LookupTable;
pub use worker::{RowLayout, RowRangeWorker};
