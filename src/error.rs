use thiserror::Error;

/// I/O errors that can occur when acquiring DICOM bytes from a source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Local filesystem read failure
    #[error("Read error: {0}")]
    Read(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Key escapes the source root or is otherwise malformed
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Errors raised while reading the structure of a DICOM Part-10 file
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The `DICM` magic was not found after the 128-byte preamble
    #[error("DICM prefix not found at offset 128, this is not a DICOM Part-10 file")]
    NotDicom,

    /// A value or header extends past the end of the buffer
    #[error("Truncated data: need {needed} bytes at offset {offset}, buffer holds {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Explicit VR bytes are not two uppercase ASCII letters
    #[error("Invalid value representation at offset {offset}: {bytes:02X?}")]
    InvalidVr { offset: usize, bytes: [u8; 2] },

    /// Required tag is missing from the dataset
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Transfer syntax is not one of the uncompressed little-endian syntaxes
    #[error("Unsupported transfer syntax: {0}")]
    UnsupportedTransferSyntax(String),

    /// Pixel data uses encapsulated (fragmented) encoding
    #[error("Encapsulated pixel data is not supported")]
    EncapsulatedPixelData,

    /// Sequence or item structure is inconsistent
    #[error("Malformed sequence at offset {offset}: {message}")]
    MalformedSequence { offset: usize, message: String },
}

/// Terminal failure of a render pipeline invocation.
///
/// Exactly one of these is produced per failed request; no raster or
/// metadata accompanies it.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The source could not be read
    #[error("Error reading DICOM file: {0}")]
    Read(#[from] IoError),

    /// The dataset structure is malformed or unsupported
    #[error("Error parsing DICOM file: {0}")]
    Parse(#[from] ParseError),

    /// The dataset has no Pixel Data element
    #[error("No pixel data found in DICOM file")]
    MissingPixelData,

    /// Bits Allocated is neither 8 nor 16
    #[error("Unsupported bit depth: {bits_allocated} bits allocated (only 8 and 16 are supported)")]
    UnsupportedBitDepth { bits_allocated: u16 },

    /// Geometry or sample layout the pipeline cannot render
    #[error("Unsupported image format: {reason}")]
    UnsupportedFormat { reason: String },

    /// Raster to image conversion failed
    #[error("Error converting image: {message}")]
    EncodeError { message: String },
}

impl RenderError {
    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        RenderError::UnsupportedFormat {
            reason: reason.into(),
        }
    }
}
