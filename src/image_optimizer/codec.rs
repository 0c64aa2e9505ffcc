//! Image codec collaborator interface
//!
//! The optimizer never touches pixels itself. It hands the original bytes
//! plus a [`TransformOptions`] to an [`ImageCodec`] and returns whatever the
//! codec produces.

use crate::error::OptimizeError;

/// Format-specific encoder settings
///
/// Each variant's numeric field means something different; the policy engine
/// decides how the requested quality maps onto them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOptions {
    /// Lossy AVIF. `effort` is 0 (fastest) to 9 (smallest output).
    Avif { quality: u8, effort: u8 },
    /// Lossy WebP
    WebP { quality: u8 },
    /// Lossless PNG. `effort` is a compression effort on the 1-100 scale,
    /// not a visual quality.
    Png { effort: u8 },
    /// Baseline JPEG. `optimized` selects the more efficient encoder variant
    /// when the codec has one.
    Jpeg { quality: u8, optimized: bool },
}

impl EncodeOptions {
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Avif { .. } => "avif",
            Self::WebP { .. } => "webp",
            Self::Png { .. } => "png",
            Self::Jpeg { .. } => "jpeg",
        }
    }
}

/// Everything the codec needs for one transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Output width upper bound in pixels
    pub max_width: u32,
    /// Never scale above the source width
    pub without_enlargement: bool,
    /// Apply EXIF orientation before resizing
    pub auto_orient: bool,
    pub encode: EncodeOptions,
}

impl TransformOptions {
    /// Options the policy engine always uses: oriented, bounded by width,
    /// never enlarged
    pub fn bounded(max_width: u32, encode: EncodeOptions) -> Self {
        Self {
            max_width,
            without_enlargement: true,
            auto_orient: true,
            encode,
        }
    }
}

/// Decodes, transforms and re-encodes a buffer
///
/// Failures for corrupt or unsupported input are returned unchanged to the
/// caller; implementations must not retry.
pub trait ImageCodec: Send + Sync {
    fn transform(&self, data: &[u8], options: &TransformOptions) -> Result<Vec<u8>, OptimizeError>;
}
