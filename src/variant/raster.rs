//! Default deriver backed by the `image` crate.
//!
//! Decodes the original, shrinks it to the target width keeping the aspect
//! ratio, and re-encodes it. Inputs the decoder does not understand are
//! declined rather than failed.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use bytes::Bytes;

use crate::variant::{Derivation, DeriveError, VariantDeriver, VariantFormat, VariantSpec};

/// Resizes and re-encodes raster images in process.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDeriver;

impl RasterDeriver {
    pub fn new() -> Self {
        Self
    }
}

/// Target dimensions for a width, never upscaling.
fn target_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    if width <= target_width {
        return (width, height);
    }
    let scaled = (u64::from(height) * u64::from(target_width) + u64::from(width) / 2) / u64::from(width);
    (target_width, scaled.max(1) as u32)
}

fn encode(image: &DynamicImage, spec: &VariantSpec) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    match spec.format {
        // The `image` crate only ships a lossless WebP encoder; quality does not apply.
        VariantFormat::WebP => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(WebPEncoder::new_lossless(&mut out))?
        }
        VariantFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, spec.quality.percent()))?,
        VariantFormat::Png => image.write_with_encoder(PngEncoder::new(&mut out))?,
    }
    Ok(out)
}

impl VariantDeriver for RasterDeriver {
    fn derive(&self, original: &[u8], spec: &VariantSpec) -> Result<Derivation, DeriveError> {
        let format = match image::guess_format(original) {
            Ok(format) => format,
            Err(e) => {
                tracing::debug!(error = %e, "Unrecognized image format, declining");
                return Ok(Derivation::Declined);
            }
        };

        let decoded = match image::load_from_memory_with_format(original, format) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(format = ?format, error = %e, "Failed to decode original, declining");
                return Ok(Derivation::Declined);
            }
        };

        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 || spec.width == 0 {
            return Ok(Derivation::Declined);
        }

        let (target_width, target_height) = target_dimensions(width, height, spec.width);
        let resized = if (target_width, target_height) == (width, height) {
            decoded
        } else {
            decoded.resize_exact(target_width, target_height, FilterType::Triangle)
        };

        let encoded = encode(&resized, spec).map_err(|e| DeriveError::Encode {
            format: spec.format,
            reason: e.to_string(),
        })?;

        tracing::debug!(
            source_format = ?format,
            width = target_width,
            height = target_height,
            format = %spec.format,
            bytes = encoded.len(),
            "Variant derived"
        );

        Ok(Derivation::Derived(Bytes::from(encoded)))
    }
}
