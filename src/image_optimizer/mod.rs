//! Image optimization module
//!
//! Provides:
//! - Magic-byte type detection from an ordered signature registry
//! - Animation detection for GIF, APNG and WebP
//! - The optimization policy (pass-through, resize, re-encode)
//! - Fetch-and-optimize over HTTP
//!
//! # Decision chain
//!
//! ```text
//! buffer ─▶ detect ─▶ animated? ─▶ svg? ─▶ bypass? ─▶ re-encode (same format)
//! ```
//!
//! Output format always equals input format; no conversion is performed.

pub mod animation;
pub mod codec;
pub mod encoder;
pub mod fetch;
pub mod format;
pub mod policy;
pub mod processor;
pub mod signature;

// Re-export commonly used types
pub use animation::{AnimationDetector, StructuralAnimationDetector};
pub use codec::{EncodeOptions, ImageCodec, TransformOptions};
pub use encoder::{EncoderFactory, ImageEncoder};
pub use fetch::ImageFetcher;
pub use format::ImageType;
pub use policy::{encode_options_for, OptimizationRequest, OptimizationResult, Optimizer};
pub use processor::RasterCodec;
pub use signature::{detect, detect_family, SignatureEntry, SIGNATURES};
