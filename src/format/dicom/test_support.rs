//! Builders for small in-memory DICOM Part-10 files used by unit tests.

use super::tags::{DicomTag, Vr, EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN};

/// Encodes a Part-10 file element by element.
pub struct DicomFileBuilder {
    transfer_syntax: String,
    explicit: bool,
    body: Vec<u8>,
}

impl DicomFileBuilder {
    pub fn explicit() -> Self {
        Self {
            transfer_syntax: EXPLICIT_VR_LITTLE_ENDIAN.to_string(),
            explicit: true,
            body: Vec::new(),
        }
    }

    pub fn implicit() -> Self {
        Self {
            transfer_syntax: IMPLICIT_VR_LITTLE_ENDIAN.to_string(),
            explicit: false,
            body: Vec::new(),
        }
    }

    /// Override the declared transfer syntax UID without changing the encoding.
    pub fn with_transfer_syntax(mut self, uid: &str) -> Self {
        self.transfer_syntax = uid.to_string();
        self
    }

    pub fn element(mut self, tag: u32, vr: Vr, value: &[u8]) -> Self {
        let mut value = value.to_vec();
        if value.len() % 2 == 1 {
            value.push(if vr == Vr::UI { 0 } else { b' ' });
        }
        encode_element(&mut self.body, self.explicit, tag, vr, &value);
        self
    }

    pub fn string(self, tag: DicomTag, value: &str) -> Self {
        self.element(tag.as_u32(), tag.implicit_vr(), value.as_bytes())
    }

    pub fn u16(self, tag: DicomTag, value: u16) -> Self {
        self.element(tag.as_u32(), Vr::US, &value.to_le_bytes())
    }

    pub fn pixels_u16(self, samples: &[u16]) -> Self {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.element(DicomTag::PixelData.as_u32(), Vr::OW, &bytes)
    }

    pub fn pixels_u8(self, samples: &[u8]) -> Self {
        self.element(DicomTag::PixelData.as_u32(), Vr::OB, samples)
    }

    /// Append pre-encoded bytes to the dataset body.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; 128];
        out.extend_from_slice(b"DICM");

        let mut uid = self.transfer_syntax.into_bytes();
        if uid.len() % 2 == 1 {
            uid.push(0);
        }
        encode_element(
            &mut out,
            true,
            DicomTag::TransferSyntaxUid.as_u32(),
            Vr::UI,
            &uid,
        );

        out.extend_from_slice(&self.body);
        out
    }
}

/// Encode one element header and value in little endian.
pub fn encode_element(out: &mut Vec<u8>, explicit: bool, tag: u32, vr: Vr, value: &[u8]) {
    encode_header(out, explicit, tag, vr, value.len() as u32);
    out.extend_from_slice(value);
}

pub fn encode_header(out: &mut Vec<u8>, explicit: bool, tag: u32, vr: Vr, length: u32) {
    out.extend_from_slice(&((tag >> 16) as u16).to_le_bytes());
    out.extend_from_slice(&((tag & 0xFFFF) as u16).to_le_bytes());
    if explicit {
        out.extend_from_slice(&vr.0);
        if vr.has_long_length() {
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(&length.to_le_bytes());
        } else {
            out.extend_from_slice(&(length as u16).to_le_bytes());
        }
    } else {
        out.extend_from_slice(&length.to_le_bytes());
    }
}

/// Encode an item or delimitation header (no VR in any transfer syntax).
pub fn encode_item_header(out: &mut Vec<u8>, tag: u32, length: u32) {
    out.extend_from_slice(&((tag >> 16) as u16).to_le_bytes());
    out.extend_from_slice(&((tag & 0xFFFF) as u16).to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
}

/// A complete 16-bit monochrome image in explicit VR little endian.
pub fn monochrome16(rows: u16, columns: u16, samples: &[u16]) -> DicomFileBuilder {
    DicomFileBuilder::explicit()
        .u16(DicomTag::Rows, rows)
        .u16(DicomTag::Columns, columns)
        .u16(DicomTag::BitsAllocated, 16)
        .pixels_u16(samples)
}
