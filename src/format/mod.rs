//! File format parsers.
//!
//! # Supported Encodings
//!
//! - **DICOM Part-10**, Implicit VR Little Endian (`1.2.840.10008.1.2`)
//! - **DICOM Part-10**, Explicit VR Little Endian (`1.2.840.10008.1.2.1`)
//!
//! Compressed and big-endian transfer syntaxes are rejected with
//! [`ParseError::UnsupportedTransferSyntax`](crate::error::ParseError).

pub mod dicom;

pub use dicom::{is_dicom, parse_dataset, Dataset, DicomTag, TransferSyntax, Vr};
