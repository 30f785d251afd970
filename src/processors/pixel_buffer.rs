//! Owned RGBA pixel storage shared by the decoder, the conditioner and the encoder.

use crate::core::errors::DecodeError;
use image::RgbaImage;

/// An interleaved RGBA buffer, row-major, 8 bits per sample.
///
/// The sample count is always `width * height * 4`; the backing
/// [`RgbaImage`] enforces it, and `u8` samples keep every value in `[0, 255]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Number of interleaved channels per pixel.
    pub const CHANNELS: usize = 4;

    /// Builds a buffer from raw RGBA samples.
    ///
    /// # Errors
    ///
    /// * `DecodeError::ZeroDimensions` if `width` or `height` is zero.
    /// * `DecodeError::SampleCount` if `data.len() != width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimensions { width, height });
        }
        let expected = width as usize * height as usize * Self::CHANNELS;
        let actual = data.len();
        RgbaImage::from_raw(width, height, data)
            .filter(|_| actual == expected)
            .map(|image| Self { image })
            .ok_or(DecodeError::SampleCount {
                width,
                height,
                expected,
                actual,
            })
    }

    /// Builds a buffer filled with a single RGBA value.
    pub fn from_pixel(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba(rgba)),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Length of one row in samples.
    pub fn row_stride(&self) -> usize {
        self.width() as usize * Self::CHANNELS
    }

    /// Returns the RGBA samples of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// All samples, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// All samples, row-major, mutable. The length cannot change through this slice.
    pub fn as_mut_raw(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// Borrows the backing image.
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self { image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_checks_length() {
        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::SampleCount {
                expected: 16,
                actual: 15,
                ..
            }
        ));

        let err = PixelBuffer::from_raw(2, 2, vec![0; 20]).unwrap_err();
        assert!(matches!(err, DecodeError::SampleCount { actual: 20, .. }));
    }

    #[test]
    fn test_from_raw_rejects_zero_dimensions() {
        let err = PixelBuffer::from_raw(0, 4, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ZeroDimensions {
                width: 0,
                height: 4
            }
        ));
    }

    #[test]
    fn test_row_major_layout() {
        let data: Vec<u8> = (0..24).collect();
        let buffer = PixelBuffer::from_raw(3, 2, data).unwrap();
        assert_eq!(buffer.row_stride(), 12);
        assert_eq!(buffer.pixel(0, 0), [0, 1, 2, 3]);
        assert_eq!(buffer.pixel(2, 0), [8, 9, 10, 11]);
        assert_eq!(buffer.pixel(0, 1), [12, 13, 14, 15]);
        assert_eq!(buffer.as_raw().len(), buffer.pixel_count() * 4);
    }
}
