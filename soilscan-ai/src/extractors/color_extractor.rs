//! Pixel color statistics extractor
//!
//! Samples a fixed square region centered on the image and reduces it to
//! mean channel values. The resulting [`ColorSample`] feeds the fusion
//! rules; decode failures degrade the pipeline to label-only fusion
//! rather than aborting the analysis.

use crate::types::ColorSample;
use thiserror::Error;

/// Side length of the sampled square region (pixels)
const SAMPLE_REGION: u32 = 50;

/// Image bytes could not be decoded for color sampling
#[derive(Debug, Error)]
#[error("Image decode failed: {0}")]
pub struct DecodeError(#[from] image::ImageError);

/// Extract mean color statistics from raw image bytes
///
/// Decodes the image, samples a 50×50 region centered at the geometric
/// center (clamped to the image bounds for smaller images), and averages
/// each channel with integer rounding.
pub fn extract_color(image_bytes: &[u8]) -> Result<ColorSample, DecodeError> {
    let decoded = image::load_from_memory(image_bytes)?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let region_w = SAMPLE_REGION.min(width);
    let region_h = SAMPLE_REGION.min(height);
    let x0 = (width - region_w) / 2;
    let y0 = (height - region_h) / 2;

    let mut sum_r: u64 = 0;
    let mut sum_g: u64 = 0;
    let mut sum_b: u64 = 0;

    for y in y0..y0 + region_h {
        for x in x0..x0 + region_w {
            let pixel = rgb.get_pixel(x, y);
            sum_r += pixel[0] as u64;
            sum_g += pixel[1] as u64;
            sum_b += pixel[2] as u64;
        }
    }

    let count = (region_w * region_h) as f64;
    let mean_r = (sum_r as f64 / count).round() as u8;
    let mean_g = (sum_g as f64 / count).round() as u8;
    let mean_b = (sum_b as f64 / count).round() as u8;

    let sample = ColorSample::from_means(mean_r, mean_g, mean_b);

    tracing::debug!(
        width,
        height,
        region_w,
        region_h,
        r = sample.r,
        g = sample.g,
        b = sample.b,
        dominant = ?sample.dominant_channel,
        "Color sample extracted"
    );

    Ok(sample)
}
