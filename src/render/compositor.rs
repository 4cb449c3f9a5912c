//! Raster composition.
//!
//! Writes each display value into an RGBA raster as an opaque gray pixel.

use image::{Rgba, RgbaImage};

use crate::error::RenderError;

use super::decoder::{PixelGeometry, PixelSamples};
use super::window::Normalizer;

/// Build the output raster, `columns` wide and `rows` high.
///
/// Pixel `i` (row-major) gets `R = G = B = display_value(samples[i])` and
/// `A = 255`.
///
/// # Errors
///
/// `UnsupportedFormat` for multi-sample images or when the buffer does not
/// hold one sample per pixel.
pub fn composite(
    samples: &PixelSamples,
    geometry: &PixelGeometry,
    normalizer: &Normalizer,
) -> Result<RgbaImage, RenderError> {
    if geometry.samples_per_pixel != 1 {
        return Err(RenderError::unsupported(format!(
            "{} samples per pixel (only single-sample grayscale is supported)",
            geometry.samples_per_pixel
        )));
    }

    let pixel_count = geometry.pixel_count();
    if samples.len() < pixel_count {
        return Err(RenderError::unsupported(format!(
            "{} samples for {} pixels",
            samples.len(),
            pixel_count
        )));
    }

    let mut raster = RgbaImage::new(geometry.columns as u32, geometry.rows as u32);
    for (i, pixel) in raster.pixels_mut().enumerate() {
        let value = normalizer.display_value(samples.sample(i));
        *pixel = Rgba([value, value, value, 255]);
    }

    Ok(raster)
}
