// Test images

use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Gradient image encoded with the image crate
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 5 % 256) as u8, (y * 11 % 256) as u8, 200, 255])
    });
    if format == ImageFormat::Avif {
        let pixels: Vec<rgb::RGBA8> = img
            .pixels()
            .map(|p| rgb::RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        return ravif::Encoder::new()
            .with_quality(80.0)
            .with_speed(10)
            .encode_rgba(imgref::Img::new(pixels.as_slice(), width as usize, height as usize))
            .expect("Failed to encode AVIF")
            .avif_file;
    }
    if format == ImageFormat::WebP {
        return webp::Encoder::from_rgba(img.as_raw(), width, height)
            .encode(90.0)
            .to_vec();
    }

    let img = if format == ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(image::DynamicImage::ImageRgba8(img).to_rgb8())
    } else {
        image::DynamicImage::ImageRgba8(img)
    };

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)
        .expect("Failed to encode test image");
    buffer.into_inner()
}

/// 1x1 GIF with the given number of frames
pub fn gif(frames: usize) -> Vec<u8> {
    let mut data = b"GIF89a".to_vec();
    data.extend_from_slice(&[1, 0, 1, 0, 0, 0, 0]);
    for _ in 0..frames {
        // graphic control extension, then image descriptor
        data.extend_from_slice(&[0x21, 0xF9, 0x04, 0x00, 0x0A, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&[0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0]);
        data.extend_from_slice(&[0x02, 0x02, 0x44, 0x01, 0x00]);
    }
    data.push(0x3B);
    data
}

/// Just enough of a BMP header to be recognized
pub fn bmp() -> Vec<u8> {
    let mut data = b"BM".to_vec();
    data.extend_from_slice(&[0; 52]);
    data
}

pub const SVG: &[u8] =
    br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10"/></svg>"#;

pub fn dimensions(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).expect("Failed to decode output");
    (img.width(), img.height())
}
