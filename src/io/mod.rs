mod endian;
mod s3_source;
mod source;

pub use endian::{read_tag_le, read_u16_le, read_u32_le};
pub use s3_source::{create_s3_client, S3Source};
pub use source::{is_dicom_key, DicomSource, LocalSource};
