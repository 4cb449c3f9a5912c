//! # DICOM Render
//!
//! Decodes single DICOM instances and renders them as windowed 8-bit
//! grayscale PNGs for display.
//!
//! ## Features
//!
//! - **Part-10 reader**: Implicit and explicit VR little endian, with sequence skipping
//! - **Window/level**: Stored, requested or automatic windows, MONOCHROME1 inversion,
//!   padding-bit handling for 8 and 16 bit samples
//! - **Sources**: Local directories and S3-compatible object storage
//! - **HTTP API**: JSON render responses, direct PNG responses and a built-in viewer
//!
//! ## Architecture
//!
//! - [`io`] - Byte sources (local filesystem, S3)
//! - [`mod@format`] - DICOM Part-10 dataset reader
//! - [`render`] - Decode, window, composite and encode pipeline
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use dicom_render::{render_dicom, PngRasterEncoder, WindowRequest};
//!
//! let bytes = Bytes::from(std::fs::read("slice.dcm").unwrap());
//! let output = render_dicom(bytes, &WindowRequest::default(), &PngRasterEncoder::new()).unwrap();
//! std::fs::write("slice.png", &output.png).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod render;
pub mod server;

// Re-export commonly used types
pub use config::{Cli, Command, RenderConfig, ServeConfig, SourceConfig};
pub use error::{IoError, ParseError, RenderError};
pub use format::{is_dicom, parse_dataset, Dataset, DicomTag, TransferSyntax, Vr};
pub use io::{create_s3_client, DicomSource, LocalSource, S3Source};
pub use render::{
    composite, decode, extract, render_dicom, ImageMetadata, Normalizer, PixelGeometry,
    PixelRange, PixelSamples, PngCompression, PngRasterEncoder, RenderOutput, RenderRequest,
    RenderService, RenderSource, WindowLevel, WindowRequest, DEFAULT_WINDOW,
};
pub use server::{
    create_router, health_handler, AppState, ErrorResponse, HealthResponse, RenderResponse,
    RouterConfig,
};
