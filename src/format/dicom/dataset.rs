use std::collections::HashMap;

use bytes::Bytes;

use super::tags::{DicomTag, TransferSyntax, Vr};
use crate::io::read_u16_le;

/// Location of one indexed element inside the file buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub tag: DicomTag,
    pub vr: Vr,
    /// Offset of the first value byte
    pub offset: usize,
    /// Value length in bytes
    pub length: usize,
}

/// A parsed DICOM dataset.
///
/// Holds the original file buffer and the positions of the elements the
/// render pipeline reads. Value accessors slice the buffer on demand.
#[derive(Debug, Clone)]
pub struct Dataset {
    data: Bytes,
    transfer_syntax: TransferSyntax,
    elements: HashMap<DicomTag, Element>,
}

impl Dataset {
    pub(crate) fn new(
        data: Bytes,
        transfer_syntax: TransferSyntax,
        elements: HashMap<DicomTag, Element>,
    ) -> Self {
        Self {
            data,
            transfer_syntax,
            elements,
        }
    }

    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.transfer_syntax
    }

    pub fn contains(&self, tag: DicomTag) -> bool {
        self.elements.contains_key(&tag)
    }

    pub fn element(&self, tag: DicomTag) -> Option<&Element> {
        self.elements.get(&tag)
    }

    /// Number of indexed elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Raw value bytes of an element. Zero-copy.
    pub fn bytes(&self, tag: DicomTag) -> Option<Bytes> {
        let element = self.elements.get(&tag)?;
        Some(
            self.data
                .slice(element.offset..element.offset + element.length),
        )
    }

    /// String value with padding removed. Empty values read as absent.
    pub fn string(&self, tag: DicomTag) -> Option<String> {
        let element = self.elements.get(&tag)?;
        let value = decode_string(&self.data[element.offset..element.offset + element.length]);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// First 16-bit unsigned value.
    pub fn uint16(&self, tag: DicomTag) -> Option<u16> {
        let element = self.elements.get(&tag)?;
        if element.length < 2 {
            return None;
        }
        Some(read_u16_le(&self.data[element.offset..]))
    }

    /// First value of a decimal string (DS), if it parses to a finite number.
    ///
    /// Multi-valued strings such as `"40\\400"` yield their first component.
    pub fn decimal(&self, tag: DicomTag) -> Option<f64> {
        let value = self.string(tag)?;
        let first = value.split('\\').next()?.trim();
        first.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Decode a text value, dropping trailing NUL and space padding.
///
/// Bytes outside UTF-8 are replaced rather than rejected.
pub fn decode_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
