//! Image processing for the recognition pipeline.
//!
//! This module provides the pixel buffer type, the decoder and PNG encoder,
//! and the deterministic conditioning stages applied before recognition.

pub mod codec;
pub mod conditioning;
pub mod pixel_buffer;

pub use codec::{DecodedImage, EncodedImage, decode_image, encode_png, upscaled_dimensions};
pub use conditioning::{
    CONTRAST, LUMA_WEIGHTS, PixelConditioner, SHARPEN_KERNEL, contrast_factor, contrast_table,
    grayscale, sharpen, stretch_contrast,
};
pub use pixel_buffer::PixelBuffer;
