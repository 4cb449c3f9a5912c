//! DICOM tag, value representation and transfer syntax definitions.
//!
//! This module defines the vocabulary for DICOM parsing, limited to what the
//! render pipeline reads:
//! - The fixed set of attribute tags consumed by metadata extraction and
//!   pixel decoding
//! - Value representations, which decide the header layout in explicit VR
//! - The uncompressed little-endian transfer syntaxes
//!
//! Tags not listed here are skipped during parsing.

use std::fmt;

use crate::error::ParseError;

// =============================================================================
// Structural Tags
// =============================================================================

/// Item tag (FFFE,E000), introduces a sequence item.
pub const ITEM: u32 = 0xFFFE_E000;

/// Item Delimitation Item (FFFE,E00D), ends an undefined-length item.
pub const ITEM_DELIMITATION: u32 = 0xFFFE_E00D;

/// Sequence Delimitation Item (FFFE,E0DD), ends an undefined-length sequence.
pub const SEQUENCE_DELIMITATION: u32 = 0xFFFE_E0DD;

/// Length value marking an undefined-length element.
pub const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Group number of the file meta information elements.
pub const META_GROUP: u16 = 0x0002;

// =============================================================================
// Attribute Tags
// =============================================================================

/// DICOM attribute tags read by the render pipeline.
///
/// The discriminant is the tag as `0xGGGGEEEE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DicomTag {
    /// (0002,0010) Transfer Syntax UID
    TransferSyntaxUid = 0x0002_0010,

    /// (0008,0020) Study Date
    StudyDate = 0x0008_0020,

    /// (0008,0060) Modality
    Modality = 0x0008_0060,

    /// (0008,103E) Series Description
    SeriesDescription = 0x0008_103E,

    /// (0010,0010) Patient's Name
    PatientName = 0x0010_0010,

    /// (0010,0020) Patient ID
    PatientId = 0x0010_0020,

    /// (0028,0002) Samples per Pixel
    SamplesPerPixel = 0x0028_0002,

    /// (0028,0004) Photometric Interpretation
    PhotometricInterpretation = 0x0028_0004,

    /// (0028,0010) Rows
    Rows = 0x0028_0010,

    /// (0028,0011) Columns
    Columns = 0x0028_0011,

    /// (0028,0100) Bits Allocated
    BitsAllocated = 0x0028_0100,

    /// (0028,0101) Bits Stored
    BitsStored = 0x0028_0101,

    /// (0028,0102) High Bit
    HighBit = 0x0028_0102,

    /// (0028,0103) Pixel Representation
    PixelRepresentation = 0x0028_0103,

    /// (0028,1050) Window Center
    WindowCenter = 0x0028_1050,

    /// (0028,1051) Window Width
    WindowWidth = 0x0028_1051,

    /// (7FE0,0010) Pixel Data
    PixelData = 0x7FE0_0010,
}

impl DicomTag {
    /// All tags in the fixed set, in ascending tag order.
    pub const ALL: [DicomTag; 17] = [
        DicomTag::TransferSyntaxUid,
        DicomTag::StudyDate,
        DicomTag::Modality,
        DicomTag::SeriesDescription,
        DicomTag::PatientName,
        DicomTag::PatientId,
        DicomTag::SamplesPerPixel,
        DicomTag::PhotometricInterpretation,
        DicomTag::Rows,
        DicomTag::Columns,
        DicomTag::BitsAllocated,
        DicomTag::BitsStored,
        DicomTag::HighBit,
        DicomTag::PixelRepresentation,
        DicomTag::WindowCenter,
        DicomTag::WindowWidth,
        DicomTag::PixelData,
    ];

    /// Get the tag as `0xGGGGEEEE`.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Group number (high 16 bits).
    #[inline]
    pub const fn group(self) -> u16 {
        (self.as_u32() >> 16) as u16
    }

    /// Element number (low 16 bits).
    #[inline]
    pub const fn element(self) -> u16 {
        (self.as_u32() & 0xFFFF) as u16
    }

    /// Look up a tag of the fixed set. Returns `None` for any other tag.
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_u32() == value)
    }

    /// Keyword of the attribute as used in the DICOM dictionary.
    pub const fn name(self) -> &'static str {
        match self {
            DicomTag::TransferSyntaxUid => "TransferSyntaxUID",
            DicomTag::StudyDate => "StudyDate",
            DicomTag::Modality => "Modality",
            DicomTag::SeriesDescription => "SeriesDescription",
            DicomTag::PatientName => "PatientName",
            DicomTag::PatientId => "PatientID",
            DicomTag::SamplesPerPixel => "SamplesPerPixel",
            DicomTag::PhotometricInterpretation => "PhotometricInterpretation",
            DicomTag::Rows => "Rows",
            DicomTag::Columns => "Columns",
            DicomTag::BitsAllocated => "BitsAllocated",
            DicomTag::BitsStored => "BitsStored",
            DicomTag::HighBit => "HighBit",
            DicomTag::PixelRepresentation => "PixelRepresentation",
            DicomTag::WindowCenter => "WindowCenter",
            DicomTag::WindowWidth => "WindowWidth",
            DicomTag::PixelData => "PixelData",
        }
    }

    /// Dictionary VR, used when the transfer syntax does not carry one.
    pub const fn implicit_vr(self) -> Vr {
        match self {
            DicomTag::TransferSyntaxUid => Vr::UI,
            DicomTag::StudyDate => Vr::DA,
            DicomTag::Modality | DicomTag::PhotometricInterpretation => Vr::CS,
            DicomTag::SeriesDescription | DicomTag::PatientId => Vr::LO,
            DicomTag::PatientName => Vr::PN,
            DicomTag::SamplesPerPixel
            | DicomTag::Rows
            | DicomTag::Columns
            | DicomTag::BitsAllocated
            | DicomTag::BitsStored
            | DicomTag::HighBit
            | DicomTag::PixelRepresentation => Vr::US,
            DicomTag::WindowCenter | DicomTag::WindowWidth => Vr::DS,
            DicomTag::PixelData => Vr::OW,
        }
    }
}

impl fmt::Display for DicomTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:04X},{:04X}) {}",
            self.group(),
            self.element(),
            self.name()
        )
    }
}

// =============================================================================
// Value Representation
// =============================================================================

/// A two-letter DICOM value representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vr(pub [u8; 2]);

impl Vr {
    pub const CS: Vr = Vr(*b"CS");
    pub const DA: Vr = Vr(*b"DA");
    pub const DS: Vr = Vr(*b"DS");
    pub const LO: Vr = Vr(*b"LO");
    pub const OB: Vr = Vr(*b"OB");
    pub const OW: Vr = Vr(*b"OW");
    pub const PN: Vr = Vr(*b"PN");
    pub const SQ: Vr = Vr(*b"SQ");
    pub const UI: Vr = Vr(*b"UI");
    pub const UN: Vr = Vr(*b"UN");
    pub const US: Vr = Vr(*b"US");

    /// Validate two raw bytes as a VR (two uppercase ASCII letters).
    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        if bytes.iter().all(|b| b.is_ascii_uppercase()) {
            Some(Vr(bytes))
        } else {
            None
        }
    }

    /// Whether the explicit VR header uses 2 reserved bytes and a 4-byte length.
    ///
    /// All other VRs use a 2-byte length directly after the VR.
    pub fn has_long_length(self) -> bool {
        matches!(
            &self.0,
            b"OB"
                | b"OD"
                | b"OF"
                | b"OL"
                | b"OV"
                | b"OW"
                | b"SQ"
                | b"SV"
                | b"UC"
                | b"UN"
                | b"UR"
                | b"UT"
                | b"UV"
        )
    }

    /// The VR as a string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Debug for Vr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vr({})", self.as_str())
    }
}

impl fmt::Display for Vr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transfer Syntax
// =============================================================================

/// UID of Implicit VR Little Endian.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";

/// UID of Explicit VR Little Endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

/// Transfer syntaxes the parser can read.
///
/// Both are uncompressed and little-endian; big-endian, deflated and
/// encapsulated syntaxes are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSyntax {
    /// 1.2.840.10008.1.2
    ImplicitVrLittleEndian,
    /// 1.2.840.10008.1.2.1
    ExplicitVrLittleEndian,
}

impl TransferSyntax {
    /// Resolve a transfer syntax from its UID (trailing NUL padding allowed).
    pub fn from_uid(uid: &str) -> Result<Self, ParseError> {
        match uid.trim_end_matches(['\0', ' ']) {
            IMPLICIT_VR_LITTLE_ENDIAN => Ok(TransferSyntax::ImplicitVrLittleEndian),
            EXPLICIT_VR_LITTLE_ENDIAN => Ok(TransferSyntax::ExplicitVrLittleEndian),
            other => Err(ParseError::UnsupportedTransferSyntax(other.to_string())),
        }
    }

    /// Get the UID of this transfer syntax.
    pub const fn uid(self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => IMPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrLittleEndian => EXPLICIT_VR_LITTLE_ENDIAN,
        }
    }

    /// Whether element headers carry an explicit VR.
    #[inline]
    pub const fn is_explicit_vr(self) -> bool {
        matches!(self, TransferSyntax::ExplicitVrLittleEndian)
    }
}
