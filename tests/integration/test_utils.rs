//! Test utilities for integration tests.
//!
//! This module provides a mock `DicomSource` and helpers for building small
//! DICOM Part-10 files in memory.

use async_trait::async_trait;
use bytes::Bytes;
use image::RgbaImage;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use dicom_render::error::IoError;
use dicom_render::io::{is_dicom_key, DicomSource};
use dicom_render::{create_router, RenderService, RouterConfig};

// =============================================================================
// Mock DICOM Source
// =============================================================================

/// A mock source that serves pre-configured files and counts reads.
pub struct MockDicomSource {
    files: BTreeMap<String, Bytes>,
    read_count: Arc<AtomicUsize>,
}

impl MockDicomSource {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            read_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_file(mut self, key: impl Into<String>, data: Vec<u8>) -> Self {
        self.files.insert(key.into(), Bytes::from(data));
        self
    }

    /// Shared counter of `read` calls.
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.read_count)
    }
}

impl Default for MockDicomSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DicomSource for MockDicomSource {
    async fn read(&self, key: &str) -> Result<Bytes, IoError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);

        if key.split('/').any(|part| part == "..") {
            return Err(IoError::InvalidPath(key.to_string()));
        }

        self.files
            .get(key)
            .cloned()
            .ok_or_else(|| IoError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, IoError> {
        Ok(self
            .files
            .keys()
            .filter(|k| is_dicom_key(k))
            .filter(|k| prefix.map_or(true, |p| k.starts_with(p)))
            .cloned()
            .collect())
    }

    fn identifier(&self, key: &str) -> String {
        format!("mock://{}", key)
    }
}

/// A source whose every operation fails with the given error.
pub struct FailingSource(pub IoError);

#[async_trait]
impl DicomSource for FailingSource {
    async fn read(&self, _key: &str) -> Result<Bytes, IoError> {
        Err(self.0.clone())
    }

    async fn list(&self, _prefix: Option<&str>) -> Result<Vec<String>, IoError> {
        Err(self.0.clone())
    }

    fn identifier(&self, key: &str) -> String {
        format!("failing://{}", key)
    }
}

// =============================================================================
// DICOM File Builder
// =============================================================================

pub const IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";
pub const EXPLICIT_VR_BE: &str = "1.2.840.10008.1.2.2";
pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";

pub const STUDY_DATE: (u16, u16) = (0x0008, 0x0020);
pub const MODALITY: (u16, u16) = (0x0008, 0x0060);
pub const SERIES_DESCRIPTION: (u16, u16) = (0x0008, 0x103E);
pub const PATIENT_NAME: (u16, u16) = (0x0010, 0x0010);
pub const PATIENT_ID: (u16, u16) = (0x0010, 0x0020);
pub const SAMPLES_PER_PIXEL: (u16, u16) = (0x0028, 0x0002);
pub const PHOTOMETRIC: (u16, u16) = (0x0028, 0x0004);
pub const ROWS: (u16, u16) = (0x0028, 0x0010);
pub const COLUMNS: (u16, u16) = (0x0028, 0x0011);
pub const BITS_ALLOCATED: (u16, u16) = (0x0028, 0x0100);
pub const BITS_STORED: (u16, u16) = (0x0028, 0x0101);
pub const HIGH_BIT: (u16, u16) = (0x0028, 0x0102);
pub const PIXEL_REPRESENTATION: (u16, u16) = (0x0028, 0x0103);
pub const WINDOW_CENTER: (u16, u16) = (0x0028, 0x1050);
pub const WINDOW_WIDTH: (u16, u16) = (0x0028, 0x1051);
pub const PIXEL_DATA: (u16, u16) = (0x7FE0, 0x0010);

const LONG_VRS: &[&[u8; 2]] = &[
    b"OB", b"OD", b"OF", b"OL", b"OV", b"OW", b"SQ", b"SV", b"UC", b"UN", b"UR", b"UT", b"UV",
];

/// Builds DICOM Part-10 files element by element.
pub struct DicomBuilder {
    transfer_syntax: String,
    explicit: bool,
    body: Vec<u8>,
}

impl DicomBuilder {
    pub fn explicit() -> Self {
        Self {
            transfer_syntax: EXPLICIT_VR_LE.to_string(),
            explicit: true,
            body: Vec::new(),
        }
    }

    pub fn implicit() -> Self {
        Self {
            transfer_syntax: IMPLICIT_VR_LE.to_string(),
            explicit: false,
            body: Vec::new(),
        }
    }

    /// Declare a different transfer syntax without changing the encoding.
    pub fn transfer_syntax(mut self, uid: &str) -> Self {
        self.transfer_syntax = uid.to_string();
        self
    }

    pub fn element(mut self, tag: (u16, u16), vr: &[u8; 2], value: &[u8]) -> Self {
        let mut value = value.to_vec();
        if value.len() % 2 == 1 {
            value.push(if vr == b"UI" { 0 } else { b' ' });
        }
        write_header(&mut self.body, self.explicit, tag, vr, value.len() as u32);
        self.body.extend_from_slice(&value);
        self
    }

    pub fn string(self, tag: (u16, u16), vr: &[u8; 2], value: &str) -> Self {
        self.element(tag, vr, value.as_bytes())
    }

    pub fn u16(self, tag: (u16, u16), value: u16) -> Self {
        self.element(tag, b"US", &value.to_le_bytes())
    }

    pub fn pixels_u16(self, samples: &[u16]) -> Self {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.element(PIXEL_DATA, b"OW", &bytes)
    }

    pub fn pixels_i16(self, samples: &[i16]) -> Self {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.element(PIXEL_DATA, b"OW", &bytes)
    }

    pub fn pixels_u8(self, samples: &[u8]) -> Self {
        self.element(PIXEL_DATA, b"OB", samples)
    }

    /// Append an undefined-length sequence holding one undefined-length item.
    pub fn nested_sequence(mut self, tag: (u16, u16)) -> Self {
        write_header(&mut self.body, self.explicit, tag, b"SQ", 0xFFFF_FFFF);
        write_item(&mut self.body, 0xE000, 0xFFFF_FFFF);
        write_header(&mut self.body, self.explicit, (0x0008, 0x0100), b"SH", 4);
        self.body.extend_from_slice(b"T-D1");
        write_item(&mut self.body, 0xE00D, 0);
        write_item(&mut self.body, 0xE0DD, 0);
        self
    }

    /// Append an encapsulated Pixel Data element with one empty fragment.
    pub fn encapsulated_pixels(mut self) -> Self {
        write_header(&mut self.body, self.explicit, PIXEL_DATA, b"OB", 0xFFFF_FFFF);
        write_item(&mut self.body, 0xE000, 0);
        write_item(&mut self.body, 0xE0DD, 0);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; 128];
        out.extend_from_slice(b"DICM");

        let mut uid = self.transfer_syntax.into_bytes();
        if uid.len() % 2 == 1 {
            uid.push(0);
        }
        write_header(&mut out, true, (0x0002, 0x0010), b"UI", uid.len() as u32);
        out.extend_from_slice(&uid);

        out.extend_from_slice(&self.body);
        out
    }
}

fn write_header(out: &mut Vec<u8>, explicit: bool, tag: (u16, u16), vr: &[u8; 2], length: u32) {
    out.extend_from_slice(&tag.0.to_le_bytes());
    out.extend_from_slice(&tag.1.to_le_bytes());
    if !explicit {
        out.extend_from_slice(&length.to_le_bytes());
    } else if LONG_VRS.contains(&vr) {
        out.extend_from_slice(vr);
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&length.to_le_bytes());
    } else {
        out.extend_from_slice(vr);
        out.extend_from_slice(&(length as u16).to_le_bytes());
    }
}

fn write_item(out: &mut Vec<u8>, element: u16, length: u32) {
    out.extend_from_slice(&0xFFFEu16.to_le_bytes());
    out.extend_from_slice(&element.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
}

/// Unsigned 16-bit MONOCHROME2 image.
pub fn mono16(rows: u16, columns: u16, samples: &[u16]) -> DicomBuilder {
    DicomBuilder::explicit()
        .u16(ROWS, rows)
        .u16(COLUMNS, columns)
        .u16(BITS_ALLOCATED, 16)
        .pixels_u16(samples)
}

/// The 2x2 reference image `[0, 32768, 65535, 16384]` with descriptive tags.
pub fn reference_image() -> Vec<u8> {
    DicomBuilder::explicit()
        .string(STUDY_DATE, b"DA", "20240131")
        .string(MODALITY, b"CS", "CT")
        .string(SERIES_DESCRIPTION, b"LO", "AXIAL")
        .string(PATIENT_NAME, b"PN", "DOE^JANE")
        .string(PATIENT_ID, b"LO", "P-0042")
        .u16(ROWS, 2)
        .u16(COLUMNS, 2)
        .u16(BITS_ALLOCATED, 16)
        .string(WINDOW_CENTER, b"DS", "32767.5")
        .string(WINDOW_WIDTH, b"DS", "65535")
        .pixels_u16(&[0, 32768, 65535, 16384])
        .build()
}

// =============================================================================
// Router and Response Helpers
// =============================================================================

/// Router over a mock source with tracing disabled.
pub fn test_router(source: MockDicomSource) -> axum::Router {
    create_router(
        RenderService::new(source),
        RouterConfig::new().with_tracing(false),
    )
}

pub async fn send(router: axum::Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Decode a PNG into RGBA pixels.
pub fn decode_png(data: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .unwrap()
        .to_rgba8()
}

/// Red channel of every pixel, row-major.
pub fn gray_values(png: &[u8]) -> Vec<u8> {
    decode_png(png).pixels().map(|p| p.0[0]).collect()
}

pub fn is_valid_png(data: &[u8]) -> bool {
    data.len() > 8 && &data[..8] == b"\x89PNG\r\n\x1a\n"
}
