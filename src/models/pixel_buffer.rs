use crate::error::{Error, Result};

/// Width of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleDepth {
    /// Unsigned 8-bit samples (the only depth the engine thresholds)
    U8,
    /// Unsigned 16-bit samples, native endian
    U16,
    /// 32-bit float samples, native endian
    F32,
}

impl SampleDepth {
    /// Bytes occupied by one sample
    pub fn bytes(self) -> usize {
        match self {
            SampleDepth::U8 => 1,
            SampleDepth::U16 => 2,
            SampleDepth::F32 => 4,
        }
    }
}

/// Rectangular sample grid with an explicit row stride
///
/// Rows start every `row_stride` bytes; the first `row_bytes()` bytes of each
/// row are pixel data and the rest is padding. The last row may omit its
/// padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    channels: usize,
    depth: SampleDepth,
    row_stride: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap `data` after checking that the geometry describes it.
    ///
    /// Depth is not restricted here; the engine rejects non-8-bit buffers.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        depth: SampleDepth,
        row_stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(Error::InvalidInput(format!(
                "empty image: {}x{} with {} channels",
                width, height, channels
            )));
        }
        let row_bytes = width
            .checked_mul(channels)
            .and_then(|v| v.checked_mul(depth.bytes()))
            .ok_or_else(|| Error::InvalidInput("row size overflows usize".to_string()))?;
        if row_stride < row_bytes {
            return Err(Error::InvalidInput(format!(
                "row stride ({}) cannot be less than row size ({})",
                row_stride, row_bytes
            )));
        }
        let required = (height - 1)
            .checked_mul(row_stride)
            .and_then(|v| v.checked_add(row_bytes))
            .ok_or_else(|| Error::InvalidInput("image size overflows usize".to_string()))?;
        if data.len() < required {
            return Err(Error::InvalidInput(format!(
                "buffer size ({}) is too small for {}x{} image with stride {} (required: {})",
                data.len(),
                width,
                height,
                row_stride,
                required
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            depth,
            row_stride,
            data,
        })
    }

    /// Tightly packed single-channel 8-bit image
    pub fn from_gray(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        Self::new(width, height, 1, SampleDepth::U8, width, data)
    }

    /// Zero-filled buffer with the same geometry as `self`.
    ///
    /// Every row, including the last, gets its full stride.
    pub fn zeroed_like(&self) -> Result<Self> {
        let bytes = self
            .height
            .checked_mul(self.row_stride)
            .ok_or(Error::AllocationFailure { bytes: usize::MAX })?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| Error::AllocationFailure { bytes })?;
        data.resize(bytes, 0);

        Ok(Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            depth: self.depth,
            row_stride: self.row_stride,
            data,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples per pixel
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sample depth
    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    /// Byte distance between the starts of consecutive rows
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Bytes of pixel data in one row (excluding padding)
    pub fn row_bytes(&self) -> usize {
        self.width * self.channels * self.depth.bytes()
    }

    /// Samples in one row
    pub fn row_samples(&self) -> usize {
        self.width * self.channels
    }

    /// Total samples in the image
    pub fn sample_count(&self) -> usize {
        self.row_samples() * self.height
    }

    /// True when rows follow each other with no padding
    pub fn is_contiguous(&self) -> bool {
        self.row_stride == self.row_bytes()
    }

    /// True when `other` has the same width, height, channels, depth and stride
    pub fn same_geometry(&self, other: &PixelBuffer) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.channels == other.channels
            && self.depth == other.depth
            && self.row_stride == other.row_stride
    }

    /// Pixel bytes of row `y`
    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "Row index {} out of bounds", y);
        let start = y * self.row_stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// 8-bit sample at (x, y, channel)
    pub fn sample(&self, x: usize, y: usize, channel: usize) -> u8 {
        assert!(x < self.width, "Column index {} out of bounds", x);
        assert!(channel < self.channels, "Channel {} out of bounds", channel);
        self.row(y)[x * self.channels + channel]
    }

    /// Raw backing bytes, padding included
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy of the pixel data with stride padding removed
    pub fn to_packed(&self) -> Vec<u8> {
        if self.is_contiguous() {
            return self.data[..self.row_bytes() * self.height].to_vec();
        }
        let mut packed = Vec::with_capacity(self.row_bytes() * self.height);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y));
        }
        packed
    }

    /// Consume the buffer and return its backing bytes
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}
