//! DICOM Part-10 reader.
//!
//! Parses the file meta group and an uncompressed little-endian dataset,
//! indexing the elements needed to render the first frame.

mod dataset;
mod parser;
mod tags;

#[cfg(test)]
pub(crate) mod test_support;

pub use dataset::{decode_string, Dataset, Element};
pub use parser::{is_dicom, parse_dataset, DICM_MAGIC, META_OFFSET, PREAMBLE_SIZE};
pub use tags::{
    DicomTag, TransferSyntax, Vr, EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN, ITEM,
    ITEM_DELIMITATION, META_GROUP, SEQUENCE_DELIMITATION, UNDEFINED_LENGTH,
};
