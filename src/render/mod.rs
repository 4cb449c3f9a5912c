//! Render pipeline.
//!
//! Turns a parsed DICOM dataset into a windowed grayscale PNG:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             RenderService               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   decoder    │  │   Normalizer    │  │
//! │  │  (samples,   │  │  (bit shift,    │  │
//! │  │   geometry)  │  │   window/level) │  │
//! │  └──────────────┘  └─────────────────┘  │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  compositor  │  │ PngRasterEncoder│  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              DicomSource                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`RenderService`]: Reads from a source and runs [`render_dicom`]
//! - [`ImageMetadata`]: Patient/study fields and the stored window
//! - [`PixelSamples`] / [`PixelGeometry`]: First frame of Pixel Data
//! - [`Normalizer`]: Maps raw samples to 0-255
//! - [`PngRasterEncoder`]: RGBA raster to PNG

mod compositor;
mod decoder;
mod encoder;
mod metadata;
mod service;
mod window;

pub use compositor::composite;
pub use decoder::{decode, PixelGeometry, PixelSamples, MONOCHROME1, MONOCHROME2};
pub use encoder::{to_base64, PngCompression, PngRasterEncoder, PNG_SIGNATURE};
pub use metadata::{extract, ImageMetadata, DEFAULT_WINDOW};
pub use service::{
    render_dicom, RenderOutput, RenderRequest, RenderService, RenderSource, Stage,
};
pub use window::{
    apply_window, resolve_window, Normalizer, PixelRange, WindowLevel, WindowRequest,
    AUTO_CENTER_RANGE, AUTO_MAX_WIDTH,
};
