//! # Stage Definition: Pixel Conditioning
//!
//! This service is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: A decoded (and possibly upscaled) [`PixelBuffer`].
//! - **Outputs**: The same buffer, mutated in place, with identical dimensions.
//! - **Logging**: Traces buffer dimensions and whether rows ran in parallel.
//! - **Invariants**:
//!     - Stages run in the order grayscale, sharpen, contrast and never interleave.
//!     - Sharpening reads from a snapshot of the grayscale output, never from
//!       already-sharpened neighbors.
//!     - Border pixels keep their grayscale value through the sharpen stage.
//!     - Alpha is never modified.
//!     - The output is byte-identical for identical input, regardless of the
//!       parallel policy.

use crate::core::config::ParallelPolicy;
use crate::processors::PixelBuffer;
use rayon::prelude::*;
use tracing::debug;

/// ITU-R BT.601 luma weights for red, green and blue.
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// 3x3 sharpening kernel, row-major.
pub const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// Contrast amount used by the stretch stage, on the usual -255..=255 scale.
pub const CONTRAST: f64 = 1.8;

const CHANNELS: usize = PixelBuffer::CHANNELS;

/// Rounds half-to-even and clamps into the sample range.
fn clamp_sample(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Replaces R, G and B of every pixel by its luma; alpha is untouched.
///
/// Applying this twice yields the same buffer as applying it once.
pub fn grayscale(buffer: &mut PixelBuffer, policy: &ParallelPolicy) {
    let to_gray = |pixel: &mut [u8]| {
        let gray = clamp_sample(
            LUMA_WEIGHTS[0] * f64::from(pixel[0])
                + LUMA_WEIGHTS[1] * f64::from(pixel[1])
                + LUMA_WEIGHTS[2] * f64::from(pixel[2]),
        );
        pixel[0] = gray;
        pixel[1] = gray;
        pixel[2] = gray;
    };

    if policy.should_parallelize(buffer.pixel_count()) {
        buffer.as_mut_raw().par_chunks_mut(CHANNELS).for_each(to_gray);
    } else {
        buffer.as_mut_raw().chunks_mut(CHANNELS).for_each(to_gray);
    }
}

/// Applies [`SHARPEN_KERNEL`] to the gray channel of interior pixels.
///
/// Only pixels with `1 <= x < width - 1` and `1 <= y < height - 1` are written;
/// the border is left exactly as it was. Each output reads the red sample of
/// its 3x3 neighborhood from a snapshot taken before the stage started, and the
/// sum is clamped to `[0, 255]`. Buffers narrower or shorter than 3 pixels have
/// no interior and are returned unchanged.
pub fn sharpen(buffer: &mut PixelBuffer, policy: &ParallelPolicy) {
    let (width, height) = (buffer.width() as usize, buffer.height() as usize);
    if width < 3 || height < 3 {
        return;
    }

    let snapshot = buffer.as_raw().to_vec();
    let stride = buffer.row_stride();
    let sharpen_row = |(y, row): (usize, &mut [u8])| {
        if y == 0 || y == height - 1 {
            return;
        }
        for x in 1..width - 1 {
            let mut sum = 0i32;
            for (ky, kernel_row) in SHARPEN_KERNEL.iter().enumerate() {
                let sy = y + ky - 1;
                for (kx, weight) in kernel_row.iter().enumerate() {
                    let sx = x + kx - 1;
                    sum += i32::from(snapshot[(sy * width + sx) * CHANNELS]) * weight;
                }
            }
            let value = sum.clamp(0, 255) as u8;
            let idx = x * CHANNELS;
            row[idx] = value;
            row[idx + 1] = value;
            row[idx + 2] = value;
        }
    };

    if policy.should_parallelize(buffer.pixel_count()) {
        buffer
            .as_mut_raw()
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(sharpen_row);
    } else {
        buffer
            .as_mut_raw()
            .chunks_mut(stride)
            .enumerate()
            .for_each(sharpen_row);
    }
}

/// Contrast multiplier for a contrast amount `c`: `259(c + 255) / (255(259 - c))`.
pub fn contrast_factor(contrast: f64) -> f64 {
    (259.0 * (contrast + 255.0)) / (255.0 * (259.0 - contrast))
}

/// Lookup table mapping every input sample to its stretched value.
pub fn contrast_table(contrast: f64) -> [u8; 256] {
    let factor = contrast_factor(contrast);
    std::array::from_fn(|sample| clamp_sample(factor * (sample as f64 - 128.0) + 128.0))
}

/// Stretches R, G and B of every pixel, borders included, around mid-gray.
pub fn stretch_contrast(buffer: &mut PixelBuffer, policy: &ParallelPolicy) {
    let table = contrast_table(CONTRAST);
    let stretch = |pixel: &mut [u8]| {
        for sample in &mut pixel[..3] {
            *sample = table[usize::from(*sample)];
        }
    };

    if policy.should_parallelize(buffer.pixel_count()) {
        buffer.as_mut_raw().par_chunks_mut(CHANNELS).for_each(stretch);
    } else {
        buffer.as_mut_raw().chunks_mut(CHANNELS).for_each(stretch);
    }
}

/// Runs the three conditioning stages in their fixed order.
#[derive(Debug, Clone, Default)]
pub struct PixelConditioner {
    policy: ParallelPolicy,
}

impl PixelConditioner {
    /// Creates a conditioner with the given parallel policy.
    pub fn new(policy: ParallelPolicy) -> Self {
        Self { policy }
    }

    /// Conditions the buffer in place and returns it.
    pub fn condition(&self, mut buffer: PixelBuffer) -> PixelBuffer {
        debug!(
            width = buffer.width(),
            height = buffer.height(),
            parallel = self.policy.should_parallelize(buffer.pixel_count()),
            "conditioning image"
        );
        grayscale(&mut buffer, &self.policy);
        sharpen(&mut buffer, &self.policy);
        stretch_contrast(&mut buffer, &self.policy);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a buffer with a deterministic, varied color pattern.
    fn patterned(width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(((x * 37 + y * 11) % 256) as u8);
                data.push(((x * 5 + y * 73) % 256) as u8);
                data.push(((x * y + 19) % 256) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }
        PixelBuffer::from_raw(width, height, data).unwrap()
    }

    fn sequential() -> ParallelPolicy {
        ParallelPolicy::new().with_conditioning_pixel_threshold(usize::MAX)
    }

    fn always_parallel() -> ParallelPolicy {
        ParallelPolicy::new().with_conditioning_pixel_threshold(0)
    }

    #[test]
    fn test_grayscale_uses_luma_weights() {
        let mut buffer = PixelBuffer::from_raw(1, 1, vec![200, 100, 50, 77]).unwrap();
        grayscale(&mut buffer, &sequential());
        // 0.299*200 + 0.587*100 + 0.114*50 = 124.2
        assert_eq!(buffer.pixel(0, 0), [124, 124, 124, 77]);
    }

    #[test]
    fn test_grayscale_is_idempotent() {
        let mut once = patterned(17, 9);
        grayscale(&mut once, &sequential());
        let mut twice = once.clone();
        grayscale(&mut twice, &sequential());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sharpen_preserves_borders() {
        let mut gray = patterned(11, 7);
        grayscale(&mut gray, &sequential());
        let mut sharpened = gray.clone();
        sharpen(&mut sharpened, &sequential());

        let (w, h) = gray.dimensions();
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    assert_eq!(sharpened.pixel(x, y), gray.pixel(x, y), "({x}, {y})");
                }
            }
        }
        assert_ne!(sharpened, gray);
    }

    #[test]
    fn test_sharpen_reads_from_snapshot() {
        // Middle row of a 5x3 field is [0, 100, 50, 100, 0], everything else 0.
        // Pixel (2, 1) must see its original left neighbor (100), not the
        // sharpened and clamped 255, which would drive it to 0.
        let row = [0u8, 100, 50, 100, 0];
        let mut data = vec![0u8; 5 * 3 * 4];
        for (i, pixel) in data.chunks_mut(4).enumerate() {
            let value = if i / 5 == 1 { row[i % 5] } else { 0 };
            pixel.copy_from_slice(&[value, value, value, 255]);
        }
        let mut buffer = PixelBuffer::from_raw(5, 3, data).unwrap();
        sharpen(&mut buffer, &sequential());

        assert_eq!(buffer.pixel(1, 1), [255, 255, 255, 255]);
        assert_eq!(buffer.pixel(2, 1), [50, 50, 50, 255]);
        assert_eq!(buffer.pixel(3, 1), [255, 255, 255, 255]);
        // Border pixels keep their values.
        assert_eq!(buffer.pixel(0, 1), [0, 0, 0, 255]);
        assert_eq!(buffer.pixel(2, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_sharpen_flat_region_is_unchanged() {
        let mut buffer = PixelBuffer::from_pixel(6, 6, [90, 90, 90, 255]);
        sharpen(&mut buffer, &sequential());
        assert_eq!(buffer, PixelBuffer::from_pixel(6, 6, [90, 90, 90, 255]));
    }

    #[test]
    fn test_sharpen_skips_tiny_images() {
        let original = patterned(2, 5);
        let mut buffer = original.clone();
        sharpen(&mut buffer, &sequential());
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_contrast_factor_value() {
        let factor = contrast_factor(CONTRAST);
        assert!((factor - 1.014_107).abs() < 1e-6, "factor was {factor}");
    }

    #[test]
    fn test_contrast_table_keeps_range_and_midpoint() {
        let table = contrast_table(CONTRAST);
        assert_eq!(table[128], 128);
        assert_eq!(table[0], 0);
        assert_eq!(table[255], 255);
        assert!(table.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_stretch_contrast_leaves_alpha() {
        let mut buffer = PixelBuffer::from_pixel(3, 3, [10, 10, 10, 42]);
        stretch_contrast(&mut buffer, &sequential());
        let expected = contrast_table(CONTRAST)[10];
        assert_eq!(buffer.pixel(0, 0), [expected, expected, expected, 42]);
        assert_eq!(buffer.pixel(1, 1), [expected, expected, expected, 42]);
    }

    #[test]
    fn test_condition_is_deterministic_and_preserves_dimensions() {
        let input = patterned(33, 21);
        let conditioner = PixelConditioner::default();
        let first = conditioner.condition(input.clone());
        let second = conditioner.condition(input.clone());
        assert_eq!(first, second);
        assert_eq!(first.dimensions(), input.dimensions());
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let input = patterned(64, 48);
        let sequential = PixelConditioner::new(sequential()).condition(input.clone());
        let parallel = PixelConditioner::new(always_parallel()).condition(input);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_condition_outputs_gray_pixels() {
        let output = PixelConditioner::default().condition(patterned(9, 9));
        for pixel in output.as_raw().chunks(4) {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }
}
