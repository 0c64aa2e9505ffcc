//! Default image codec implementation
//!
//! Handles the actual image transformation: decode → orient → resize → encode

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::io::Cursor;
use std::num::NonZeroU32;

use crate::error::OptimizeError;

use super::codec::{ImageCodec, TransformOptions};
use super::encoder::EncoderFactory;

/// Pure-Rust codec: `image` for decoding, `fast_image_resize` for scaling and
/// the encoders from [`super::encoder`] for output
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    fn transform(&self, data: &[u8], options: &TransformOptions) -> Result<Vec<u8>, OptimizeError> {
        let format = options.encode.format_name();

        // 1. Decode the image
        let mut img = decode_image(data, format)?;

        // 2. Apply EXIF orientation so width refers to the displayed image
        if options.auto_orient {
            img = apply_orientation(img, read_orientation(data));
        }
        let src_width = img.width();
        let src_height = img.height();

        // 3. Calculate target dimensions
        let (target_width, target_height) = calculate_dimensions(
            src_width,
            src_height,
            options.max_width,
            options.without_enlargement,
        );

        tracing::debug!(
            format,
            src_width,
            src_height,
            target_width,
            target_height,
            "Transforming image"
        );

        // 4. Resize if dimensions changed
        let processed = if target_width != src_width || target_height != src_height {
            resize_image(&img, target_width, target_height, format)?
        } else {
            img
        };

        // 5. Encode to the target format
        let encoder = EncoderFactory::create(&options.encode);
        let rgba = processed.to_rgba8();
        encoder.encode(rgba.as_raw(), target_width, target_height)
    }
}

/// Decode image data into a DynamicImage
fn decode_image(data: &[u8], format: &str) -> Result<DynamicImage, OptimizeError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| OptimizeError::codec_with_cause(format, e))?
        .decode()
        .map_err(|e| OptimizeError::codec_with_cause(format, e))
}

/// EXIF orientation tag value, 1 (upright) when absent or unreadable
fn read_orientation(data: &[u8]) -> u32 {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(_) => return 1,
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(1)
}

/// Rotate/flip so the pixels match the displayed orientation
fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Calculate target dimensions, keeping the aspect ratio
fn calculate_dimensions(
    src_width: u32,
    src_height: u32,
    max_width: u32,
    without_enlargement: bool,
) -> (u32, u32) {
    if src_width == 0 || src_height == 0 {
        return (src_width, src_height);
    }

    let target_width = if without_enlargement {
        max_width.min(src_width)
    } else {
        max_width
    }
    .max(1);

    if target_width == src_width {
        return (src_width, src_height);
    }

    let scale = target_width as f64 / src_width as f64;
    let target_height = ((src_height as f64 * scale).round() as u32).max(1);
    (target_width, target_height)
}

/// Resize image using fast-image-resize with Lanczos3 filter
fn resize_image(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
    format: &str,
) -> Result<DynamicImage, OptimizeError> {
    let src_width = NonZeroU32::new(img.width())
        .ok_or_else(|| OptimizeError::codec(format, "Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| OptimizeError::codec(format, "Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| OptimizeError::codec(format, "Target width is 0"))?;
    let dst_height = NonZeroU32::new(target_h)
        .ok_or_else(|| OptimizeError::codec(format, "Target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| {
        OptimizeError::codec(format, format!("Failed to create source image: {:?}", e))
    })?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| OptimizeError::codec(format, format!("Resize operation failed: {:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| OptimizeError::codec(format, "Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}
