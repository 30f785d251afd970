//! Decoding encoded images into pixel buffers and encoding them back.
//!
//! The decoder applies the shared upscale rule so that small photos reach the
//! recognition engine with an effective resolution comparable to large ones.

use crate::core::errors::{DecodeError, OCRError, ProcessingStage};
use crate::processors::PixelBuffer;
use image::imageops::FilterType;
use std::io::Cursor;
use tracing::debug;

/// Result of decoding an image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// The (possibly upscaled) pixel data.
    pub buffer: PixelBuffer,
    /// Width of the source image before upscaling.
    pub original_width: u32,
    /// Height of the source image before upscaling.
    pub original_height: u32,
}

impl DecodedImage {
    /// Whether the decoder resampled the image.
    pub fn was_upscaled(&self) -> bool {
        self.buffer.dimensions() != (self.original_width, self.original_height)
    }
}

/// Computes the dimensions an image is resampled to before conditioning.
///
/// If the longer side is below `target`, both sides are scaled by
/// `target / max(width, height)`: the longer side becomes exactly `target`
/// and the shorter one is rounded down (never below 1). Otherwise the
/// dimensions are returned unchanged.
pub fn upscaled_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let long = width.max(height);
    if long == 0 || long >= target {
        return (width, height);
    }
    let scale = |side: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(target) / u64::from(long);
        (scaled as u32).max(1)
    };
    (scale(width), scale(height))
}

/// Decodes raw image bytes into an RGBA pixel buffer.
///
/// # Arguments
///
/// * `bytes` - Encoded image data (PNG, JPEG, WebP, BMP, TIFF, ...)
/// * `upscale_target` - Long side small images are upscaled to; `None` keeps the source size
///
/// # Errors
///
/// * `DecodeError::Empty` for zero-length input
/// * `DecodeError::Unsupported` if the format is unknown or the data is malformed
/// * `DecodeError::ZeroDimensions` if the decoded image has no pixels
pub fn decode_image(bytes: &[u8], upscale_target: Option<u32>) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let image = image::load_from_memory(bytes).map_err(DecodeError::Unsupported)?;
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroDimensions { width, height });
    }

    let rgba = image.to_rgba8();
    let rgba = match upscale_target {
        Some(target) => {
            let (new_width, new_height) = upscaled_dimensions(width, height, target);
            if (new_width, new_height) != (width, height) {
                debug!(width, height, new_width, new_height, "upscaling image");
                image::imageops::resize(&rgba, new_width, new_height, FilterType::CatmullRom)
            } else {
                rgba
            }
        }
        None => rgba,
    };

    Ok(DecodedImage {
        buffer: PixelBuffer::from(rgba),
        original_width: width,
        original_height: height,
    })
}

/// A conditioned image in a transportable encoding, as handed to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    mime_type: &'static str,
}

impl EncodedImage {
    /// Wraps already encoded bytes.
    pub fn new(bytes: Vec<u8>, width: u32, height: u32, mime_type: &'static str) -> Self {
        Self {
            bytes,
            width,
            height,
            mime_type,
        }
    }

    /// The encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// MIME type of the encoding, e.g. `image/png`.
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }
}

/// Encodes a pixel buffer as PNG.
pub fn encode_png(buffer: &PixelBuffer) -> Result<EncodedImage, OCRError> {
    let mut bytes = Vec::new();
    buffer
        .as_image()
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| OCRError::processing(ProcessingStage::Encoding, "PNG encoding", e))?;
    let (width, height) = buffer.dimensions();
    Ok(EncodedImage::new(bytes, width, height, "image/png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_upscaled_dimensions() {
        assert_eq!(upscaled_dimensions(500, 500, 2000), (2000, 2000));
        assert_eq!(upscaled_dimensions(1000, 300, 2000), (2000, 600));
        assert_eq!(upscaled_dimensions(300, 999, 2000), (600, 2000));
        assert_eq!(upscaled_dimensions(3, 1000, 2000), (6, 2000));
        assert_eq!(upscaled_dimensions(1, 1999, 2000), (1, 2000));
    }

    #[test]
    fn test_large_images_are_not_resized() {
        assert_eq!(upscaled_dimensions(2000, 10, 2000), (2000, 10));
        assert_eq!(upscaled_dimensions(4000, 3000, 2000), (4000, 3000));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(matches!(decode_image(&[], Some(2000)), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_image(b"GIF89a? not really", None).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }

    #[test]
    fn test_decode_upscales_small_images() {
        let decoded = decode_image(&png_bytes(40, 20), Some(200)).unwrap();
        assert_eq!(decoded.buffer.dimensions(), (200, 100));
        assert_eq!((decoded.original_width, decoded.original_height), (40, 20));
        assert!(decoded.was_upscaled());
    }

    #[test]
    fn test_decode_without_upscale() {
        let decoded = decode_image(&png_bytes(40, 20), None).unwrap();
        assert_eq!(decoded.buffer.dimensions(), (40, 20));
        assert_eq!(decoded.buffer.pixel(0, 0), [10, 20, 30, 255]);
        assert!(!decoded.was_upscaled());
    }

    #[test]
    fn test_encode_png_roundtrips_dimensions() {
        let buffer = PixelBuffer::from_pixel(7, 5, [1, 2, 3, 4]);
        let encoded = encode_png(&buffer).unwrap();
        assert_eq!((encoded.width(), encoded.height()), (7, 5));
        assert_eq!(encoded.mime_type(), "image/png");
        assert!(encoded.bytes().starts_with(b"\x89PNG"));

        let decoded = decode_image(encoded.bytes(), None).unwrap();
        assert_eq!(decoded.buffer, buffer);
    }
}
