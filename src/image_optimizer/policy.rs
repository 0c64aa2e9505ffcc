//! Optimization policy
//!
//! A linear decision chain: classify, reject animated or disallowed content,
//! pass through formats that are never re-encoded, and otherwise hand the
//! bytes to the codec with format-specific encoder settings.

use bytes::Bytes;
use std::sync::Arc;

use crate::error::OptimizeError;

use super::animation::{AnimationDetector, StructuralAnimationDetector};
use super::codec::{EncodeOptions, ImageCodec, TransformOptions};
use super::format::ImageType;
use super::processor::RasterCodec;
use super::signature;

/// Subtracted from the requested quality for AVIF
pub const AVIF_QUALITY_OFFSET: u8 = 20;
/// AVIF encoder effort; low because the encoder is slow
pub const AVIF_EFFORT: u8 = 3;

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// A single optimization call's input
#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub buffer: Bytes,
    /// Output width upper bound in pixels
    pub width: u32,
    /// 1-100
    pub quality: u8,
    pub allow_svg: bool,
}

impl OptimizationRequest {
    /// Build a request, validating width and quality
    pub fn new(
        buffer: impl Into<Bytes>,
        width: u32,
        quality: u8,
        allow_svg: bool,
    ) -> Result<Self, OptimizeError> {
        Self::validate_params(width, quality)?;

        Ok(Self {
            buffer: buffer.into(),
            width,
            quality,
            allow_svg,
        })
    }

    /// Check width and quality without a buffer, so callers can fail before
    /// doing any I/O
    pub fn validate_params(width: u32, quality: u8) -> Result<(), OptimizeError> {
        if width == 0 {
            return Err(OptimizeError::invalid_param("width", "must be positive"));
        }
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(OptimizeError::invalid_param(
                "quality",
                format!("must be between {} and {}", MIN_QUALITY, MAX_QUALITY),
            ));
        }
        Ok(())
    }
}

/// Output of one optimization
///
/// `content_type` and `cache_control` are only set when the input came from
/// an upstream fetch, copied from its response headers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptimizationResult {
    pub buffer: Bytes,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

/// Encoder settings for a detected type, `None` for types that are never
/// re-encoded
pub fn encode_options_for(image_type: ImageType, quality: u8) -> Option<EncodeOptions> {
    match image_type {
        ImageType::Avif => Some(EncodeOptions::Avif {
            quality: quality.saturating_sub(AVIF_QUALITY_OFFSET).max(MIN_QUALITY),
            effort: AVIF_EFFORT,
        }),
        ImageType::WebP => Some(EncodeOptions::WebP { quality }),
        // same number, different meaning: compression effort, not fidelity
        ImageType::Png => Some(EncodeOptions::Png { effort: quality }),
        ImageType::Jpeg => Some(EncodeOptions::Jpeg {
            quality,
            optimized: true,
        }),
        _ => None,
    }
}

/// Policy engine bound to a codec and an animation detector
#[derive(Clone)]
pub struct Optimizer {
    codec: Arc<dyn ImageCodec>,
    animation: Arc<dyn AnimationDetector>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(Arc::new(RasterCodec), Arc::new(StructuralAnimationDetector))
    }
}

impl std::fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer").finish_non_exhaustive()
    }
}

impl Optimizer {
    pub fn new(codec: Arc<dyn ImageCodec>, animation: Arc<dyn AnimationDetector>) -> Self {
        Self { codec, animation }
    }

    /// Run the policy on one request
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when no signature matches
    /// - `UnsupportedAnimated` for animated GIF/PNG/WebP
    /// - `SvgNotAllowed` for SVG without `allow_svg`
    /// - `Codec` when the codec fails
    pub fn optimize(&self, request: &OptimizationRequest) -> Result<Bytes, OptimizeError> {
        let image_type = match signature::detect(&request.buffer) {
            Some(t) => t,
            None => {
                tracing::debug!(len = request.buffer.len(), "Rejecting unrecognized buffer");
                return Err(OptimizeError::InvalidInput);
            }
        };

        if image_type.is_animatable() && self.animation.is_animated(&request.buffer) {
            tracing::debug!(detected_type = %image_type, "Rejecting animated image");
            return Err(OptimizeError::UnsupportedAnimated);
        }

        if image_type.is_vector() {
            if !request.allow_svg {
                tracing::debug!("Rejecting SVG");
                return Err(OptimizeError::SvgNotAllowed);
            }
            return Ok(request.buffer.clone());
        }

        let encode = match encode_options_for(image_type, request.quality) {
            Some(encode) if !image_type.is_bypass() => encode,
            _ => {
                tracing::debug!(detected_type = %image_type, "Bypassing optimization");
                return Ok(request.buffer.clone());
            }
        };

        tracing::debug!(
            detected_type = %image_type,
            width = request.width,
            quality = request.quality,
            encode = ?encode,
            "Optimizing image"
        );

        let options = TransformOptions::bounded(request.width, encode);
        match self.codec.transform(&request.buffer, &options) {
            Ok(output) => Ok(Bytes::from(output)),
            Err(e) => {
                tracing::warn!(detected_type = %image_type, error = %e, "Image codec failed");
                Err(e)
            }
        }
    }
}
