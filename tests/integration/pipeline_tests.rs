//! End-to-end render pipeline tests.
//!
//! These run `render_dicom` on in-memory files and check the decoded PNG.

use bytes::Bytes;

use dicom_render::error::{ParseError, RenderError};
use dicom_render::render::{
    render_dicom, PngCompression, PngRasterEncoder, RenderOutput, WindowLevel, WindowRequest,
    DEFAULT_WINDOW,
};

use super::test_utils::*;

fn render(file: Vec<u8>, request: WindowRequest) -> Result<RenderOutput, RenderError> {
    render_dicom(Bytes::from(file), &request, &PngRasterEncoder::new())
}

fn window(width: f64, center: f64) -> WindowRequest {
    WindowRequest::new(Some(width), Some(center))
}

// =============================================================================
// Windowing
// =============================================================================

#[test]
fn test_reference_image_round_trip() {
    let output = render(reference_image(), WindowRequest::default()).unwrap();

    assert_eq!((output.width, output.height), (2, 2));
    assert_eq!(output.window, WindowLevel::new(65535.0, 32767.5));

    let raster = decode_png(&output.png);
    let expected = [0u8, 128, 255, 64];
    for (pixel, value) in raster.pixels().zip(expected) {
        assert_eq!(pixel.0, [value, value, value, 255]);
    }
}

#[test]
fn test_signed_ct_window() {
    let file = DicomBuilder::explicit()
        .u16(ROWS, 1)
        .u16(COLUMNS, 4)
        .u16(BITS_ALLOCATED, 16)
        .u16(PIXEL_REPRESENTATION, 1)
        .string(WINDOW_CENTER, b"DS", "40")
        .string(WINDOW_WIDTH, b"DS", "400")
        .pixels_i16(&[-1024, 0, 40, 3071])
        .build();

    let output = render(file, WindowRequest::default()).unwrap();
    assert_eq!(output.range.min, -1024);
    assert_eq!(output.range.max, 3071);
    assert_eq!(gray_values(&output.png), vec![0, 102, 128, 255]);
}

#[test]
fn test_multi_value_window_uses_first() {
    let file = mono16(1, 2, &[0, 200])
        .string(WINDOW_CENTER, b"DS", "100\\40")
        .string(WINDOW_WIDTH, b"DS", "200\\400")
        .build();

    let output = render(file, WindowRequest::default()).unwrap();
    assert_eq!(output.window, WindowLevel::new(200.0, 100.0));
}

#[test]
fn test_monochrome1_inverts_against_max() {
    let file = mono16(1, 3, &[0, 100, 200])
        .string(PHOTOMETRIC, b"CS", "MONOCHROME1")
        .build();

    let output = render(file, window(200.0, 100.0)).unwrap();
    assert_eq!(gray_values(&output.png), vec![255, 128, 0]);
}

#[test]
fn test_eight_bit_default_window() {
    let file = DicomBuilder::explicit()
        .u16(ROWS, 1)
        .u16(COLUMNS, 3)
        .u16(BITS_ALLOCATED, 8)
        .pixels_u8(&[0, 127, 255])
        .build();

    let output = render(file, WindowRequest::default()).unwrap();
    assert_eq!(output.window, DEFAULT_WINDOW);
    assert_eq!(gray_values(&output.png), vec![1, 128, 255]);
}

#[test]
fn test_invalid_requested_width_uses_default() {
    for width in [0.0, -400.0] {
        let output = render(reference_image(), window(width, 40.0)).unwrap();
        assert_eq!(output.window, DEFAULT_WINDOW);
    }
}

#[test]
fn test_request_overrides_one_field() {
    let output = render(reference_image(), WindowRequest::new(Some(1000.0), None)).unwrap();
    assert_eq!(output.window, WindowLevel::new(1000.0, 32767.5));
}

#[test]
fn test_auto_window_clamped() {
    let file = DicomBuilder::explicit()
        .u16(ROWS, 1)
        .u16(COLUMNS, 2)
        .u16(BITS_ALLOCATED, 16)
        .u16(PIXEL_REPRESENTATION, 1)
        .pixels_i16(&[-2000, 5000])
        .build();

    let output = render(file, WindowRequest::auto()).unwrap();
    assert_eq!(output.window, WindowLevel::new(4096.0, 1024.0));
}

#[test]
fn test_missing_window_tags_report_defaults() {
    let output = render(mono16(1, 1, &[7]).build(), window(10.0, 5.0)).unwrap();
    assert_eq!(output.metadata.window_width, 256.0);
    assert_eq!(output.metadata.window_center, 127.0);
    assert_eq!(output.window, WindowLevel::new(10.0, 5.0));
}

// =============================================================================
// Bit Layout
// =============================================================================

#[test]
fn test_padding_bits_high_bit_at_top() {
    let file = mono16(1, 2, &[0xFFF0, 0x0010])
        .u16(BITS_STORED, 12)
        .u16(HIGH_BIT, 15)
        .build();

    let output = render(file, window(4096.0, 2048.0)).unwrap();
    assert_eq!(gray_values(&output.png), vec![255, 0]);
}

#[test]
fn test_padding_bits_low_aligned() {
    let file = mono16(1, 2, &[4095, 0])
        .u16(BITS_STORED, 12)
        .u16(HIGH_BIT, 11)
        .build();

    let output = render(file, window(4096.0, 2048.0)).unwrap();
    assert_eq!(gray_values(&output.png), vec![255, 0]);
}

#[test]
fn test_unsigned_high_bits_survive_shift() {
    let file = mono16(1, 2, &[0x0800, 0xF800])
        .u16(BITS_STORED, 12)
        .u16(HIGH_BIT, 11)
        .build();

    let output = render(file, window(65536.0, 32768.0)).unwrap();
    assert_eq!(gray_values(&output.png), vec![8, 247]);
}

#[test]
fn test_only_first_frame_rendered() {
    // Two 1x2 frames back to back
    let file = mono16(1, 2, &[0, 255, 9999, 9999]).build();

    let output = render(file, window(255.0, 127.5)).unwrap();
    assert_eq!((output.width, output.height), (2, 1));
    assert_eq!(gray_values(&output.png), vec![0, 255]);
}

// =============================================================================
// Encodings
// =============================================================================

#[test]
fn test_implicit_vr_matches_explicit() {
    let samples = [0u16, 32768, 65535, 16384];
    let implicit = DicomBuilder::implicit()
        .u16(ROWS, 2)
        .u16(COLUMNS, 2)
        .u16(BITS_ALLOCATED, 16)
        .pixels_u16(&samples)
        .build();
    let explicit = mono16(2, 2, &samples).build();

    let a = render(implicit, window(65535.0, 32767.5)).unwrap();
    let b = render(explicit, window(65535.0, 32767.5)).unwrap();
    assert_eq!(gray_values(&a.png), gray_values(&b.png));
}

#[test]
fn test_sequences_are_skipped() {
    let file = DicomBuilder::explicit()
        .nested_sequence((0x0008, 0x1140))
        .string(MODALITY, b"CS", "MR")
        .u16(ROWS, 1)
        .u16(COLUMNS, 1)
        .u16(BITS_ALLOCATED, 16)
        .pixels_u16(&[1])
        .build();

    let output = render(file, WindowRequest::default()).unwrap();
    assert_eq!(output.metadata.modality, "MR");
}

#[test]
fn test_render_is_deterministic() {
    let a = render(reference_image(), WindowRequest::default()).unwrap();
    let b = render(reference_image(), WindowRequest::default()).unwrap();
    assert_eq!(a.png, b.png);
}

#[test]
fn test_compression_levels_preserve_pixels() {
    let expected = gray_values(&render(reference_image(), WindowRequest::default()).unwrap().png);

    for compression in [PngCompression::Fast, PngCompression::Best] {
        let output = render_dicom(
            Bytes::from(reference_image()),
            &WindowRequest::default(),
            &PngRasterEncoder::with_compression(compression),
        )
        .unwrap();
        assert_eq!(gray_values(&output.png), expected);
    }
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_missing_pixel_data() {
    let file = DicomBuilder::explicit()
        .u16(ROWS, 2)
        .u16(COLUMNS, 2)
        .u16(BITS_ALLOCATED, 16)
        .build();
    assert!(matches!(
        render(file, WindowRequest::default()),
        Err(RenderError::MissingPixelData)
    ));
}

#[test]
fn test_missing_rows() {
    let file = DicomBuilder::explicit()
        .u16(COLUMNS, 1)
        .u16(BITS_ALLOCATED, 16)
        .pixels_u16(&[1])
        .build();
    assert!(matches!(
        render(file, WindowRequest::default()),
        Err(RenderError::Parse(ParseError::MissingTag(_)))
    ));
}

#[test]
fn test_unsupported_bit_depth() {
    let file = DicomBuilder::explicit()
        .u16(ROWS, 1)
        .u16(COLUMNS, 1)
        .u16(BITS_ALLOCATED, 32)
        .pixels_u8(&[0, 0, 0, 0])
        .build();
    assert!(matches!(
        render(file, WindowRequest::default()),
        Err(RenderError::UnsupportedBitDepth { bits_allocated: 32 })
    ));
}

#[test]
fn test_color_rejected() {
    let file = DicomBuilder::explicit()
        .u16(SAMPLES_PER_PIXEL, 3)
        .string(PHOTOMETRIC, b"CS", "RGB")
        .u16(ROWS, 1)
        .u16(COLUMNS, 1)
        .u16(BITS_ALLOCATED, 8)
        .pixels_u8(&[10, 20, 30])
        .build();
    assert!(matches!(
        render(file, WindowRequest::default()),
        Err(RenderError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_short_pixel_data() {
    let file = mono16(4, 4, &[1, 2]).build();
    assert!(matches!(
        render(file, WindowRequest::default()),
        Err(RenderError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_encapsulated_pixel_data() {
    let file = DicomBuilder::explicit()
        .u16(ROWS, 1)
        .u16(COLUMNS, 1)
        .u16(BITS_ALLOCATED, 8)
        .encapsulated_pixels()
        .build();
    assert!(matches!(
        render(file, WindowRequest::default()),
        Err(RenderError::Parse(ParseError::EncapsulatedPixelData))
    ));
}
