pub mod pixel_buffer;
pub mod threshold;

pub use pixel_buffer::{PixelBuffer, SampleDepth};
pub use threshold::{RowRange, ThresholdRange};
