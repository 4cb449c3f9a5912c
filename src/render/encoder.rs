//! PNG raster encoder.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::RenderError;

/// PNG signature bytes.
pub const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

// =============================================================================
// Compression Level
// =============================================================================

/// Trade-off between encode time and PNG size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl PngCompression {
    fn compression_type(self) -> CompressionType {
        match self {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

impl FromStr for PngCompression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(PngCompression::Fast),
            "default" => Ok(PngCompression::Default),
            "best" => Ok(PngCompression::Best),
            other => Err(format!(
                "unknown PNG compression '{}' (expected fast, default or best)",
                other
            )),
        }
    }
}

impl fmt::Display for PngCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PngCompression::Fast => "fast",
            PngCompression::Default => "default",
            PngCompression::Best => "best",
        };
        f.write_str(name)
    }
}

// =============================================================================
// PNG Encoder
// =============================================================================

/// Encodes RGBA rasters as PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngRasterEncoder {
    compression: PngCompression,
}

impl PngRasterEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(compression: PngCompression) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> PngCompression {
        self.compression
    }

    /// Encode a raster as an 8-bit RGBA PNG.
    ///
    /// # Errors
    ///
    /// `EncodeError` if the PNG writer fails.
    pub fn encode(&self, raster: &RgbaImage) -> Result<Bytes, RenderError> {
        let mut output = Vec::new();
        let encoder = PngEncoder::new_with_quality(
            &mut output,
            self.compression.compression_type(),
            FilterType::Adaptive,
        );

        encoder
            .write_image(
                raster.as_raw(),
                raster.width(),
                raster.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| RenderError::EncodeError {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }
}

/// Base64 (standard alphabet, padded) text of an encoded image.
pub fn to_base64(encoded: &[u8]) -> String {
    STANDARD.encode(encoded)
}
