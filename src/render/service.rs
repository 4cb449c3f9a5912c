//! Render pipeline orchestration.
//!
//! # Pipeline
//!
//! ```text
//! ┌───────────┐   ┌───────┐   ┌────────┐   ┌───────────┐   ┌───────────┐   ┌────────┐
//! │ ReadBytes │──▶│ Parse │──▶│ Decode │──▶│ Normalize │──▶│ Composite │──▶│ Encode │──▶ Transmit
//! └───────────┘   └───────┘   └────────┘   └───────────┘   └───────────┘   └────────┘
//!   DicomSource    Dataset     PixelSamples  Normalizer      RgbaImage       PNG
//! ```
//!
//! Each stage returns a `Result`; the first failure ends the request and no
//! partial output is produced. Nothing is shared between requests besides
//! the source handle and the encoder settings.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::debug;

use crate::error::{IoError, RenderError};
use crate::format::dicom::parse_dataset;
use crate::io::DicomSource;

use super::compositor::composite;
use super::decoder::decode;
use super::encoder::{to_base64, PngRasterEncoder};
use super::metadata::{extract, ImageMetadata};
use super::window::{resolve_window, Normalizer, PixelRange, WindowLevel, WindowRequest};

// =============================================================================
// Stages
// =============================================================================

/// Steps of one render, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadBytes,
    Parse,
    Decode,
    Normalize,
    Composite,
    Encode,
    Transmit,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::ReadBytes => "read_bytes",
            Stage::Parse => "parse",
            Stage::Decode => "decode",
            Stage::Normalize => "normalize",
            Stage::Composite => "composite",
            Stage::Encode => "encode",
            Stage::Transmit => "transmit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag a stage result for logging and convert its error.
fn stage<T, E: Into<RenderError>>(stage: Stage, result: Result<T, E>) -> Result<T, RenderError> {
    result.map_err(|e| {
        let error = e.into();
        debug!(stage = %stage, error = %error, "Render stage failed");
        error
    })
}

// =============================================================================
// Request / Output
// =============================================================================

/// Where the DICOM bytes come from.
#[derive(Debug, Clone)]
pub enum RenderSource {
    /// Bytes supplied with the request
    Bytes(Bytes),
    /// Key resolved against the configured `DicomSource`
    Path(String),
}

/// One render invocation.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub source: RenderSource,
    pub window: WindowRequest,
}

impl RenderRequest {
    pub fn from_bytes(bytes: Bytes, window: WindowRequest) -> Self {
        Self {
            source: RenderSource::Bytes(bytes),
            window,
        }
    }

    pub fn from_path(path: impl Into<String>, window: WindowRequest) -> Self {
        Self {
            source: RenderSource::Path(path.into()),
            window,
        }
    }
}

/// Successful render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Encoded PNG
    pub png: Bytes,
    pub metadata: ImageMetadata,
    /// Window actually applied
    pub window: WindowLevel,
    pub width: u32,
    pub height: u32,
    /// Raw sample range of the frame
    pub range: PixelRange,
}

impl RenderOutput {
    /// PNG as base64 text.
    pub fn image_base64(&self) -> String {
        to_base64(&self.png)
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Run every stage after ReadBytes on an in-memory file.
///
/// # Errors
///
/// The first stage failure, as a [`RenderError`].
pub fn render_dicom(
    bytes: Bytes,
    request: &WindowRequest,
    encoder: &PngRasterEncoder,
) -> Result<RenderOutput, RenderError> {
    let started = Instant::now();
    let input_len = bytes.len();

    let dataset = stage(Stage::Parse, parse_dataset(bytes))?;
    let metadata = extract(&dataset);

    let (samples, geometry) = stage(Stage::Decode, decode(&dataset))?;

    let range = PixelRange::scan(&samples);
    let window = resolve_window(request, metadata.window(), range);
    let normalizer = Normalizer::with_range(range, &geometry, window);
    debug!(
        stage = %Stage::Normalize,
        min = range.min,
        max = range.max,
        window_width = window.width,
        window_center = window.center,
        "Resolved display window"
    );

    let raster = stage(Stage::Composite, composite(&samples, &geometry, &normalizer))?;
    let png = stage(Stage::Encode, encoder.encode(&raster))?;

    debug!(
        rows = geometry.rows,
        columns = geometry.columns,
        bits_allocated = geometry.bits_allocated,
        input_bytes = input_len,
        png_bytes = png.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Rendered DICOM image"
    );

    Ok(RenderOutput {
        png,
        metadata,
        window,
        width: raster.width(),
        height: raster.height(),
        range,
    })
}

// =============================================================================
// Render Service
// =============================================================================

/// Renders DICOM files from uploads or from a [`DicomSource`].
///
/// # Example
///
/// ```ignore
/// use dicom_render::{LocalSource, RenderRequest, RenderService, WindowRequest};
///
/// let service = RenderService::new(LocalSource::new("/data/dicom"));
/// let output = service
///     .render(RenderRequest::from_path("ct/slice-001.dcm", WindowRequest::auto()))
///     .await?;
/// println!("{}x{} PNG, {} bytes", output.width, output.height, output.png.len());
/// ```
pub struct RenderService<S: DicomSource> {
    source: Arc<S>,
    encoder: PngRasterEncoder,
}

impl<S: DicomSource> RenderService<S> {
    pub fn new(source: S) -> Self {
        Self::with_shared_source(Arc::new(source))
    }

    pub fn with_shared_source(source: Arc<S>) -> Self {
        Self {
            source,
            encoder: PngRasterEncoder::new(),
        }
    }

    pub fn with_encoder(mut self, encoder: PngRasterEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn encoder(&self) -> &PngRasterEncoder {
        &self.encoder
    }

    /// Fetch raw bytes for a key.
    pub async fn read(&self, key: &str) -> Result<Bytes, RenderError> {
        let bytes = stage(Stage::ReadBytes, self.source.read(key).await)?;
        debug!(
            source = %self.source.identifier(key),
            bytes = bytes.len(),
            "Read DICOM file"
        );
        Ok(bytes)
    }

    /// Run the full pipeline for one request.
    pub async fn render(&self, request: RenderRequest) -> Result<RenderOutput, RenderError> {
        let bytes = match request.source {
            RenderSource::Bytes(bytes) => bytes,
            RenderSource::Path(path) => self.read(&path).await?,
        };

        render_dicom(bytes, &request.window, &self.encoder)
    }

    /// List renderable files under an optional prefix.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, IoError> {
        self.source.list(prefix).await
    }
}
