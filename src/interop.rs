//! Conversions between [`PixelBuffer`] and the `image` crate.
//!
//! Sample depth is carried over as-is: 16-bit and float images become
//! buffers the engine will reject with `UnsupportedFormat`, never silently
//! narrowed to 8 bits.

use image::{DynamicImage, GenericImageView, GrayImage};

use crate::error::{Error, Result};
use crate::models::{PixelBuffer, SampleDepth};

impl PixelBuffer {
    /// Wrap a packed 8-bit grayscale image
    pub fn from_gray_image(img: &GrayImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        PixelBuffer::from_gray(img.as_raw().clone(), width as usize, height as usize)
    }

    /// Pack a single-channel 8-bit buffer into a `GrayImage`
    pub fn into_gray_image(self) -> Result<GrayImage> {
        if self.channels() != 1 || self.depth() != SampleDepth::U8 {
            return Err(Error::UnsupportedFormat {
                depth: self.depth(),
            });
        }
        let width = u32::try_from(self.width())
            .map_err(|_| Error::InvalidInput(format!("width {} exceeds u32", self.width())))?;
        let height = u32::try_from(self.height())
            .map_err(|_| Error::InvalidInput(format!("height {} exceeds u32", self.height())))?;
        GrayImage::from_raw(width, height, self.to_packed())
            .ok_or_else(|| Error::InvalidInput("packed data does not fill the image".to_string()))
    }
}

impl TryFrom<&DynamicImage> for PixelBuffer {
    type Error = Error;

    fn try_from(img: &DynamicImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        let (width, height) = (width as usize, height as usize);

        let (channels, depth, data) = match img {
            DynamicImage::ImageLuma8(b) => (1, SampleDepth::U8, b.as_raw().clone()),
            DynamicImage::ImageLumaA8(b) => (2, SampleDepth::U8, b.as_raw().clone()),
            DynamicImage::ImageRgb8(b) => (3, SampleDepth::U8, b.as_raw().clone()),
            DynamicImage::ImageRgba8(b) => (4, SampleDepth::U8, b.as_raw().clone()),
            DynamicImage::ImageLuma16(b) => (1, SampleDepth::U16, u16_bytes(b.as_raw())),
            DynamicImage::ImageLumaA16(b) => (2, SampleDepth::U16, u16_bytes(b.as_raw())),
            DynamicImage::ImageRgb16(b) => (3, SampleDepth::U16, u16_bytes(b.as_raw())),
            DynamicImage::ImageRgba16(b) => (4, SampleDepth::U16, u16_bytes(b.as_raw())),
            DynamicImage::ImageRgb32F(b) => (3, SampleDepth::F32, f32_bytes(b.as_raw())),
            DynamicImage::ImageRgba32F(b) => (4, SampleDepth::F32, f32_bytes(b.as_raw())),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "unrecognised pixel layout {:?}",
                    img.color()
                )));
            }
        };

        let row_stride = width * channels * depth.bytes();
        PixelBuffer::new(width, height, channels, depth, row_stride, data)
    }
}

fn u16_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

fn f32_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}
