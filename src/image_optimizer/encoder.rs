//! Image encoder abstraction
//!
//! Each encoder turns RGBA pixels into one output format. The
//! [`EncoderFactory`] picks the encoder and its settings from the
//! [`EncodeOptions`] chosen by the policy engine.

use crate::error::OptimizeError;

use super::codec::EncodeOptions;
use super::format::ImageType;

/// Trait for image encoders
///
/// The trait is object-safe to allow dynamic dispatch from the factory.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> ImageType;

    /// Encode raw RGBA image data (4 bytes per pixel)
    fn encode(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, OptimizeError>;
}

/// JPEG encoder using the image crate
pub struct JpegEncoder {
    pub quality: u8,
}

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> ImageType {
        ImageType::Jpeg
    }

    fn encode(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, OptimizeError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
        use image::ImageEncoder as _;
        use std::io::Cursor;

        // JPEG has no alpha channel
        let rgb_data = rgba_to_rgb(data);

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, self.quality.clamp(1, 100));

        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8)
            .map_err(|e| OptimizeError::codec_with_cause("jpeg", e))?;

        Ok(output.into_inner())
    }
}

/// Lossless PNG encoder: image crate encode followed by an oxipng pass
pub struct PngEncoder {
    /// Compression effort, 1-100
    pub effort: u8,
}

/// Highest oxipng preset
const OXIPNG_MAX_PRESET: u8 = 6;

impl PngEncoder {
    /// Scale the 1-100 effort onto oxipng's 0-6 presets
    pub fn preset(&self) -> u8 {
        let effort = u16::from(self.effort.clamp(1, 100));
        (effort * u16::from(OXIPNG_MAX_PRESET) / 100) as u8
    }
}

impl ImageEncoder for PngEncoder {
    fn format(&self) -> ImageType {
        ImageType::Png
    }

    fn encode(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, OptimizeError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;
        use image::ImageEncoder as _;
        use std::io::Cursor;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImagePngEncoder::new(&mut output);

        encoder
            .write_image(data, width, height, image::ColorType::Rgba8)
            .map_err(|e| OptimizeError::codec_with_cause("png", e))?;

        let options = oxipng::Options::from_preset(self.preset());
        oxipng::optimize_from_memory(&output.into_inner(), &options)
            .map_err(|e| OptimizeError::codec("png", e.to_string()))
    }
}

/// Lossy WebP encoder backed by libwebp
pub struct WebPEncoder {
    pub quality: u8,
}

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> ImageType {
        ImageType::WebP
    }

    fn encode(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, OptimizeError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(OptimizeError::codec(
                "webp",
                format!("expected {} bytes of RGBA data, got {}", expected, data.len()),
            ));
        }

        let encoder = webp::Encoder::from_rgba(data, width, height);
        let encoded = encoder
            .encode_simple(false, f32::from(self.quality.clamp(1, 100)))
            .map_err(|e| OptimizeError::codec("webp", format!("libwebp failed: {:?}", e)))?;
        Ok(encoded.to_vec())
    }
}

/// AVIF encoder backed by ravif
pub struct AvifEncoder {
    pub quality: u8,
    /// 0 (fastest) to 9 (slowest/best compression)
    pub effort: u8,
}

impl AvifEncoder {
    /// ravif counts speed the other way round: 1 is slowest, 10 fastest
    pub fn speed(&self) -> u8 {
        10 - self.effort.min(9)
    }
}

impl ImageEncoder for AvifEncoder {
    fn format(&self) -> ImageType {
        ImageType::Avif
    }

    fn encode(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, OptimizeError> {
        let pixels: Vec<rgb::RGBA8> = data
            .chunks_exact(4)
            .map(|p| rgb::RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        if pixels.len() != width as usize * height as usize {
            return Err(OptimizeError::codec(
                "avif",
                format!("expected {} pixels, got {}", width * height, pixels.len()),
            ));
        }

        let image = imgref::Img::new(pixels.as_slice(), width as usize, height as usize);
        let encoded = ravif::Encoder::new()
            .with_quality(f32::from(self.quality.clamp(1, 100)))
            .with_speed(self.speed())
            .encode_rgba(image)
            .map_err(|e| OptimizeError::codec("avif", e.to_string()))?;

        Ok(encoded.avif_file)
    }
}

/// Factory for creating encoders from policy options
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(options: &EncodeOptions) -> Box<dyn ImageEncoder> {
        match *options {
            EncodeOptions::Avif { quality, effort } => Box::new(AvifEncoder { quality, effort }),
            EncodeOptions::WebP { quality } => Box::new(WebPEncoder { quality }),
            EncodeOptions::Png { effort } => Box::new(PngEncoder { effort }),
            // the image crate ships a single baseline encoder, `optimized`
            // has nothing to select here
            EncodeOptions::Jpeg { quality, .. } => Box::new(JpegEncoder { quality }),
        }
    }
}

/// Convert RGBA to RGB by discarding alpha channel
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let pixel_count = rgba.len() / 4;
    let mut rgb = Vec::with_capacity(pixel_count * 3);

    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }

    rgb
}
