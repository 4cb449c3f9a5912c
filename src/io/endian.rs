// =============================================================================
// Endian Helper Functions
// =============================================================================
//
// Only little-endian transfer syntaxes are supported, so these are the only
// readers the DICOM parser and pixel decoder need.

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a little-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a little-endian DICOM tag (group, element) as a single u32.
///
/// The group occupies the high 16 bits, matching the `(GGGG,EEEE)` notation.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_tag_le(bytes: &[u8]) -> u32 {
    let group = read_u16_le(&bytes[0..2]) as u32;
    let element = read_u16_le(&bytes[2..4]) as u32;
    (group << 16) | element
}
