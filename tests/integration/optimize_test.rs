//! Policy engine on real encoded images

use super::fixtures::{bmp, dimensions, encoded_image, gif};
use hachidori::error::ErrorKind;
use hachidori::image_optimizer::{detect, ImageType, OptimizationRequest, Optimizer};
use image::ImageFormat;

fn optimize(buffer: Vec<u8>, width: u32, quality: u8) -> Result<bytes::Bytes, hachidori::error::OptimizeError> {
    let request = OptimizationRequest::new(buffer, width, quality, false)?;
    Optimizer::default().optimize(&request)
}

#[test]
fn test_output_format_matches_input_format() {
    let cases = [
        (ImageFormat::Png, ImageType::Png),
        (ImageFormat::Jpeg, ImageType::Jpeg),
        (ImageFormat::WebP, ImageType::WebP),
    ];

    for (format, expected) in cases {
        let output = optimize(encoded_image(32, 16, format), 8, 80).unwrap();
        assert_eq!(detect(&output), Some(expected), "{:?}", format);
        assert_eq!(dimensions(&output), (8, 4), "{:?}", format);
    }
}

#[test]
fn test_width_above_source_keeps_dimensions() {
    let output = optimize(encoded_image(24, 12, ImageFormat::Png), 4000, 75).unwrap();
    assert_eq!(dimensions(&output), (24, 12));
}

#[test]
fn test_static_gif_passes_through_unchanged() {
    let input = gif(1);
    let output = optimize(input.clone(), 10, 75).unwrap();
    assert_eq!(output.as_ref(), input.as_slice());
}

#[test]
fn test_bmp_passes_through_unchanged() {
    let input = bmp();
    assert_eq!(detect(&input), Some(ImageType::Bmp));

    let output = optimize(input.clone(), 2, 75).unwrap();
    assert_eq!(output.as_ref(), input.as_slice());
}

#[test]
fn test_animated_gif_is_rejected() {
    let err = optimize(gif(2), 10, 75).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedAnimated);
}

#[test]
fn test_empty_buffer_is_invalid_input() {
    let err = optimize(Vec::new(), 10, 75).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_avif_is_reencoded_as_avif_at_bounded_width() {
    let input = encoded_image(64, 32, ImageFormat::Avif);
    assert_eq!(detect(&input), Some(ImageType::Avif));

    let output = optimize(input, 16, 75).unwrap();
    assert_eq!(&output[4..12], b"ftypavif");
    assert_eq!(detect(&output), Some(ImageType::Avif));
    assert_eq!(dimensions(&output), (16, 8));
}
