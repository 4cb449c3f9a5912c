//! Pixel Data decoding.
//!
//! Turns the Pixel Data element into a typed sample buffer, resolving the
//! image geometry from the dataset with the usual defaults:
//!
//! | Field | Default |
//! |---|---|
//! | Bits Stored | Bits Allocated |
//! | High Bit | Bits Stored - 1 |
//! | Pixel Representation | 0 (unsigned) |
//! | Samples per Pixel | 1 |
//! | Photometric Interpretation | `MONOCHROME2` |
//!
//! Only the first frame is decoded.

use crate::error::{ParseError, RenderError};
use crate::format::dicom::{Dataset, DicomTag};
use crate::io::read_u16_le;

/// Photometric interpretation that inverts intensities.
pub const MONOCHROME1: &str = "MONOCHROME1";

/// Photometric interpretation used when the tag is absent.
pub const MONOCHROME2: &str = "MONOCHROME2";

// =============================================================================
// Geometry
// =============================================================================

/// Image geometry and sample encoding for one decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGeometry {
    pub rows: u16,
    pub columns: u16,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    pub high_bit: u16,
    /// 0 = unsigned, 1 = two's complement
    pub pixel_representation: u16,
    pub samples_per_pixel: u16,
    pub photometric_interpretation: String,
}

impl PixelGeometry {
    /// Read geometry from a dataset, applying defaults for optional tags.
    ///
    /// # Errors
    /// `Parse(MissingTag)` when Rows, Columns or Bits Allocated is absent.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self, RenderError> {
        let required = |tag: DicomTag| {
            dataset
                .uint16(tag)
                .ok_or(RenderError::Parse(ParseError::MissingTag(tag.name())))
        };

        let rows = required(DicomTag::Rows)?;
        let columns = required(DicomTag::Columns)?;
        let bits_allocated = required(DicomTag::BitsAllocated)?;
        let bits_stored = dataset
            .uint16(DicomTag::BitsStored)
            .unwrap_or(bits_allocated);
        let high_bit = dataset
            .uint16(DicomTag::HighBit)
            .unwrap_or_else(|| bits_stored.saturating_sub(1));

        Ok(Self {
            rows,
            columns,
            bits_allocated,
            bits_stored,
            high_bit,
            pixel_representation: dataset.uint16(DicomTag::PixelRepresentation).unwrap_or(0),
            samples_per_pixel: dataset.uint16(DicomTag::SamplesPerPixel).unwrap_or(1),
            photometric_interpretation: dataset
                .string(DicomTag::PhotometricInterpretation)
                .unwrap_or_else(|| MONOCHROME2.to_string()),
        })
    }

    /// Number of pixels in one frame.
    pub fn pixel_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Number of samples in one frame.
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.samples_per_pixel as usize
    }

    pub fn is_signed(&self) -> bool {
        self.pixel_representation == 1
    }

    pub fn is_inverted(&self) -> bool {
        self.photometric_interpretation == MONOCHROME1
    }

    /// Reject layouts the normalizer cannot interpret.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.bits_allocated != 8 && self.bits_allocated != 16 {
            return Err(RenderError::UnsupportedBitDepth {
                bits_allocated: self.bits_allocated,
            });
        }
        if self.rows == 0 || self.columns == 0 {
            return Err(RenderError::unsupported(format!(
                "image has zero dimension ({}x{})",
                self.columns, self.rows
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(RenderError::unsupported("samples per pixel is 0"));
        }
        if self.bits_stored == 0 || self.bits_stored > self.bits_allocated {
            return Err(RenderError::unsupported(format!(
                "bits stored {} incompatible with bits allocated {}",
                self.bits_stored, self.bits_allocated
            )));
        }
        if self.high_bit < self.bits_stored - 1 || self.high_bit >= self.bits_allocated {
            return Err(RenderError::unsupported(format!(
                "high bit {} outside [{}, {})",
                self.high_bit,
                self.bits_stored - 1,
                self.bits_allocated
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Samples
// =============================================================================

/// Raw samples of the first frame, typed by bit depth and sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelSamples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
}

impl PixelSamples {
    pub fn len(&self) -> usize {
        match self {
            PixelSamples::U8(v) => v.len(),
            PixelSamples::U16(v) => v.len(),
            PixelSamples::I16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index`, widened to `i32`.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    #[inline]
    pub fn sample(&self, index: usize) -> i32 {
        match self {
            PixelSamples::U8(v) => v[index] as i32,
            PixelSamples::U16(v) => v[index] as i32,
            PixelSamples::I16(v) => v[index] as i32,
        }
    }

    /// Iterate all samples widened to `i32`.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.len()).map(move |i| self.sample(i))
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the first frame of Pixel Data.
///
/// # Errors
///
/// - `MissingPixelData` when (7FE0,0010) is absent
/// - `Parse(MissingTag)` when Rows, Columns or Bits Allocated is absent
/// - `UnsupportedBitDepth` when Bits Allocated is not 8 or 16
/// - `UnsupportedFormat` for an inconsistent layout or short Pixel Data
pub fn decode(dataset: &Dataset) -> Result<(PixelSamples, PixelGeometry), RenderError> {
    let pixel_data = dataset
        .bytes(DicomTag::PixelData)
        .ok_or(RenderError::MissingPixelData)?;

    let geometry = PixelGeometry::from_dataset(dataset)?;
    geometry.validate()?;

    let count = geometry.sample_count();
    let bytes_per_sample = geometry.bits_allocated as usize / 8;
    let needed = count * bytes_per_sample;
    if pixel_data.len() < needed {
        return Err(RenderError::unsupported(format!(
            "pixel data holds {} bytes, {}x{}x{} samples of {} bits need {}",
            pixel_data.len(),
            geometry.columns,
            geometry.rows,
            geometry.samples_per_pixel,
            geometry.bits_allocated,
            needed
        )));
    }

    let frame = &pixel_data[..needed];
    let samples = match (geometry.bits_allocated, geometry.is_signed()) {
        (8, _) => PixelSamples::U8(frame.to_vec()),
        (16, false) => PixelSamples::U16(frame.chunks_exact(2).map(read_u16_le).collect()),
        (16, true) => PixelSamples::I16(
            frame
                .chunks_exact(2)
                .map(|c| read_u16_le(c) as i16)
                .collect(),
        ),
        (bits_allocated, _) => return Err(RenderError::UnsupportedBitDepth { bits_allocated }),
    };

    Ok((samples, geometry))
}
