//! DICOM Part-10 file parsing.
//!
//! # File Structure
//!
//! ```text
//! Bytes 0-127:   Preamble (ignored)
//! Bytes 128-131: "DICM" magic
//! Bytes 132-:    File meta group (0002,xxxx), always explicit VR little endian
//! Then:          Dataset, encoded per the meta group's Transfer Syntax UID
//! ```
//!
//! # Element Headers
//!
//! ```text
//! Implicit VR:          tag(4) length(4)
//! Explicit VR, short:   tag(4) VR(2) length(2)
//! Explicit VR, long:    tag(4) VR(2) reserved(2) length(4)
//! Items / delimiters:   tag(4) length(4)
//! ```
//!
//! The parser indexes only the tags of [`DicomTag`] and never copies values.
//! Undefined-length sequences are walked item by item so the elements that
//! follow them (Pixel Data in particular) can be located.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use crate::error::ParseError;
use crate::io::{read_tag_le, read_u16_le, read_u32_le};

use super::dataset::{decode_string, Dataset, Element};
use super::tags::{
    DicomTag, TransferSyntax, Vr, ITEM, ITEM_DELIMITATION, META_GROUP, SEQUENCE_DELIMITATION,
    UNDEFINED_LENGTH,
};

// =============================================================================
// Constants
// =============================================================================

/// Size of the preamble preceding the magic bytes
pub const PREAMBLE_SIZE: usize = 128;

/// Magic bytes after the preamble
pub const DICM_MAGIC: &[u8; 4] = b"DICM";

/// Offset of the first file meta element
pub const META_OFFSET: usize = PREAMBLE_SIZE + DICM_MAGIC.len();

/// Size of the smallest element header
const MIN_HEADER_SIZE: usize = 8;

/// Nesting limit for undefined-length sequences
const MAX_SEQUENCE_DEPTH: usize = 64;

/// Check whether a buffer starts with a Part-10 preamble and magic.
pub fn is_dicom(bytes: &[u8]) -> bool {
    bytes.len() >= META_OFFSET && &bytes[PREAMBLE_SIZE..META_OFFSET] == DICM_MAGIC
}

// =============================================================================
// Element Reader
// =============================================================================

/// Decoded element header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ElementHeader {
    tag: u32,
    vr: Option<Vr>,
    length: u32,
    value_offset: usize,
}

impl ElementHeader {
    fn is_undefined_length(&self) -> bool {
        self.length == UNDEFINED_LENGTH
    }
}

/// Sequential reader of element headers over a byte buffer.
struct ElementReader<'a> {
    data: &'a [u8],
    pos: usize,
    explicit: bool,
}

impl<'a> ElementReader<'a> {
    fn new(data: &'a [u8], pos: usize, explicit: bool) -> Self {
        Self {
            data,
            pos,
            explicit,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn ensure(&self, offset: usize, needed: usize) -> Result<(), ParseError> {
        let end = offset.checked_add(needed);
        match end {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(ParseError::Truncated {
                offset,
                needed,
                available: self.data.len(),
            }),
        }
    }

    fn peek_tag(&self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        Some(read_tag_le(&self.data[self.pos..]))
    }

    fn read_header(&mut self) -> Result<ElementHeader, ParseError> {
        let start = self.pos;
        self.ensure(start, MIN_HEADER_SIZE)?;

        let tag = read_tag_le(&self.data[start..]);

        // Items and delimiters never carry a VR
        if (tag >> 16) as u16 == 0xFFFE {
            let length = read_u32_le(&self.data[start + 4..]);
            self.pos = start + 8;
            return Ok(ElementHeader {
                tag,
                vr: None,
                length,
                value_offset: self.pos,
            });
        }

        if !self.explicit {
            let length = read_u32_le(&self.data[start + 4..]);
            self.pos = start + 8;
            return Ok(ElementHeader {
                tag,
                vr: None,
                length,
                value_offset: self.pos,
            });
        }

        let vr_bytes = [self.data[start + 4], self.data[start + 5]];
        let vr = Vr::from_bytes(vr_bytes).ok_or(ParseError::InvalidVr {
            offset: start + 4,
            bytes: vr_bytes,
        })?;

        let length = if vr.has_long_length() {
            self.ensure(start, 12)?;
            self.pos = start + 12;
            read_u32_le(&self.data[start + 8..])
        } else {
            self.pos = start + 8;
            read_u16_le(&self.data[start + 6..]) as u32
        };

        Ok(ElementHeader {
            tag,
            vr: Some(vr),
            length,
            value_offset: self.pos,
        })
    }

    /// Move past a defined-length value.
    fn skip_value(&mut self, header: &ElementHeader) -> Result<(), ParseError> {
        let length = header.length as usize;
        self.ensure(header.value_offset, length)?;
        self.pos = header.value_offset + length;
        Ok(())
    }

    /// Move past an undefined-length value (a sequence, or UN encoded as one).
    ///
    /// Undefined-length UN content is always implicit VR little endian.
    fn skip_undefined(&mut self, header: &ElementHeader, depth: usize) -> Result<(), ParseError> {
        if depth >= MAX_SEQUENCE_DEPTH {
            return Err(ParseError::MalformedSequence {
                offset: header.value_offset,
                message: "sequence nesting too deep".to_string(),
            });
        }

        let saved = self.explicit;
        if header.vr == Some(Vr::UN) {
            self.explicit = false;
        }
        let result = self.skip_sequence_items(depth);
        self.explicit = saved;
        result
    }

    fn skip_sequence_items(&mut self, depth: usize) -> Result<(), ParseError> {
        loop {
            let item = self.read_header()?;
            match item.tag {
                SEQUENCE_DELIMITATION => return Ok(()),
                ITEM if item.is_undefined_length() => self.skip_item_elements(depth)?,
                ITEM => self.skip_value(&item)?,
                other => {
                    return Err(ParseError::MalformedSequence {
                        offset: item.value_offset.saturating_sub(8),
                        message: format!("expected item tag, found {:08X}", other),
                    })
                }
            }
        }
    }

    fn skip_item_elements(&mut self, depth: usize) -> Result<(), ParseError> {
        loop {
            let element = self.read_header()?;
            if element.tag == ITEM_DELIMITATION {
                return Ok(());
            }
            if element.is_undefined_length() {
                self.skip_undefined(&element, depth + 1)?;
            } else {
                self.skip_value(&element)?;
            }
        }
    }
}

// =============================================================================
// Dataset Parsing
// =============================================================================

fn index_element(elements: &mut HashMap<DicomTag, Element>, header: &ElementHeader) {
    if let Some(tag) = DicomTag::from_u32(header.tag) {
        elements.insert(
            tag,
            Element {
                tag,
                vr: header.vr.unwrap_or(tag.implicit_vr()),
                offset: header.value_offset,
                length: header.length as usize,
            },
        );
    }
}

/// Parse a DICOM Part-10 file into a tag-indexed [`Dataset`].
///
/// # Errors
/// - `NotDicom` if the preamble and `DICM` magic are absent
/// - `MissingTag` if the meta group has no Transfer Syntax UID
/// - `UnsupportedTransferSyntax` for anything but implicit/explicit VR little endian
/// - `EncapsulatedPixelData` if Pixel Data has undefined length
/// - `Truncated`, `InvalidVr`, `MalformedSequence` for structural damage
pub fn parse_dataset(data: Bytes) -> Result<Dataset, ParseError> {
    if !is_dicom(&data) {
        return Err(ParseError::NotDicom);
    }

    let mut elements = HashMap::new();

    // File meta group
    let mut reader = ElementReader::new(&data, META_OFFSET, true);
    while let Some(tag) = reader.peek_tag() {
        if (tag >> 16) as u16 != META_GROUP {
            break;
        }
        let header = reader.read_header()?;
        if header.is_undefined_length() {
            return Err(ParseError::MalformedSequence {
                offset: header.value_offset,
                message: "undefined length in file meta group".to_string(),
            });
        }
        reader.skip_value(&header)?;
        index_element(&mut elements, &header);
    }

    let uid_element = elements
        .get(&DicomTag::TransferSyntaxUid)
        .ok_or(ParseError::MissingTag(DicomTag::TransferSyntaxUid.name()))?;
    let uid = decode_string(&data[uid_element.offset..uid_element.offset + uid_element.length]);
    let transfer_syntax = TransferSyntax::from_uid(&uid)?;

    // Dataset body
    let mut reader = ElementReader::new(&data, reader.pos, transfer_syntax.is_explicit_vr());
    while reader.remaining() >= MIN_HEADER_SIZE {
        let header = reader.read_header()?;

        if header.is_undefined_length() {
            if header.tag == DicomTag::PixelData.as_u32() {
                return Err(ParseError::EncapsulatedPixelData);
            }
            reader.skip_undefined(&header, 0)?;
            continue;
        }

        reader.skip_value(&header)?;
        index_element(&mut elements, &header);
    }

    debug!(
        transfer_syntax = transfer_syntax.uid(),
        elements = elements.len(),
        bytes = data.len(),
        "Parsed DICOM dataset"
    );

    Ok(Dataset::new(data, transfer_syntax, elements))
}

// =============================================================================
// Tests
// =============================================================================
