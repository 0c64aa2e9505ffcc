//! Animated content detection
//!
//! Only structural markers are inspected: chunk and block headers are walked
//! with bounds-checked offsets, checksums are never verified and no pixel
//! data is decoded.

use super::format::ImageType;
use super::signature;

/// Decides whether a buffer holds more than one frame
pub trait AnimationDetector: Send + Sync {
    fn is_animated(&self, data: &[u8]) -> bool;
}

/// Marker-based detector for GIF, APNG and animated WebP
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralAnimationDetector;

impl AnimationDetector for StructuralAnimationDetector {
    fn is_animated(&self, data: &[u8]) -> bool {
        match signature::detect(data) {
            Some(ImageType::Gif) => is_animated_gif(data),
            Some(ImageType::Png) => is_animated_png(data),
            Some(ImageType::WebP) => is_animated_webp(data),
            _ => false,
        }
    }
}

const GIF_GRAPHIC_CONTROL: [u8; 3] = [0x21, 0xF9, 0x04];
const GIF_IMAGE_DESCRIPTOR: u8 = 0x2C;

/// More than one graphic control extension immediately followed by an image
/// descriptor
fn is_animated_gif(data: &[u8]) -> bool {
    // 3 byte introducer, 4 byte payload, terminator, descriptor
    const FRAME_MARKER_LEN: usize = 9;

    let mut frames = 0;
    let mut offset = 0;
    while offset + FRAME_MARKER_LEN <= data.len() {
        let window = &data[offset..offset + FRAME_MARKER_LEN];
        if window[..3] == GIF_GRAPHIC_CONTROL && window[7] == 0x00 && window[8] == GIF_IMAGE_DESCRIPTOR
        {
            frames += 1;
            if frames > 1 {
                return true;
            }
            offset += FRAME_MARKER_LEN;
        } else {
            offset += 1;
        }
    }
    false
}

/// An `acTL` chunk appearing before the first `IDAT`
fn is_animated_png(data: &[u8]) -> bool {
    let mut offset = 8;
    while let Some(header) = data.get(offset..offset + 8) {
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        match &header[4..8] {
            b"acTL" => return true,
            b"IDAT" => return false,
            _ => {}
        }
        // length + type + data + crc
        offset = match offset
            .checked_add(12)
            .and_then(|o| o.checked_add(length))
        {
            Some(next) => next,
            None => return false,
        };
    }
    false
}

const WEBP_ANIMATION_FLAG: u8 = 0x02;

/// `VP8X` with the animation flag set, or any `ANIM`/`ANMF` chunk
fn is_animated_webp(data: &[u8]) -> bool {
    let mut offset = 12;
    while let Some(header) = data.get(offset..offset + 8) {
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        match &header[..4] {
            b"VP8X" => {
                if let Some(flags) = data.get(offset + 8) {
                    if flags & WEBP_ANIMATION_FLAG != 0 {
                        return true;
                    }
                }
            }
            b"ANIM" | b"ANMF" => return true,
            _ => {}
        }
        // chunks are padded to an even size
        let padded = size + (size & 1);
        offset = match offset.checked_add(8).and_then(|o| o.checked_add(padded)) {
            Some(next) => next,
            None => return false,
        };
    }
    false
}
