use super::scalar;
use super::simd::VectorKernel;
use super::table::LookupTable;
use crate::models::{RowRange, ThresholdRange};

/// Row geometry shared by source and destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    /// Bytes of sample data per row
    pub row_bytes: usize,
    /// Bytes between row starts
    pub row_stride: usize,
}

impl RowLayout {
    /// Rows packed back to back
    pub fn is_contiguous(&self) -> bool {
        self.row_bytes == self.row_stride
    }
}

/// Thresholds one band of rows.
///
/// Holds only shared read-only state, so a single worker can serve every
/// band of an image from any thread.
#[derive(Debug, Clone, Copy)]
pub struct RowRangeWorker<'a> {
    table: &'a LookupTable,
    range: ThresholdRange,
    vector: Option<VectorKernel>,
    layout: RowLayout,
}

impl<'a> RowRangeWorker<'a> {
    pub fn new(
        table: &'a LookupTable,
        range: ThresholdRange,
        vector: Option<VectorKernel>,
        layout: RowLayout,
    ) -> Self {
        Self {
            table,
            range,
            vector,
            layout,
        }
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }

    /// Process `rows`.
    ///
    /// `src_band` and `dst_band` both start at row `rows.start`. Each must
    /// hold at least `(rows.len() - 1) * row_stride + row_bytes` bytes; only
    /// the sample bytes of each row are read or written, never the padding.
    pub fn run(&self, rows: RowRange, src_band: &[u8], dst_band: &mut [u8]) {
        if rows.is_empty() {
            return;
        }
        let RowLayout {
            row_bytes,
            row_stride,
        } = self.layout;

        if self.layout.is_contiguous() {
            // One flat span for the whole band
            let n = rows.len() * row_bytes;
            self.process_span(&src_band[..n], &mut dst_band[..n]);
            return;
        }

        for r in 0..rows.len() {
            let offset = r * row_stride;
            self.process_span(
                &src_band[offset..offset + row_bytes],
                &mut dst_band[offset..offset + row_bytes],
            );
        }
    }

    #[inline]
    fn process_span(&self, src: &[u8], dst: &mut [u8]) {
        let consumed = match self.vector {
            Some(kernel) => kernel.apply(src, dst, self.range),
            None => 0,
        };
        scalar::apply_row(src, dst, self.table, consumed);
    }
}
