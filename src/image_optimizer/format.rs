//! Detected image types and their policy groupings
//!
//! The set is closed: every family reported by the signature registry maps
//! onto exactly one [`ImageType`].

use std::fmt;
use std::str::FromStr;

/// Image type identified from a buffer's leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
    WebP,
    Avif,
    Svg,
    Bmp,
    Ico,
    Icns,
    Tiff,
    Jxl,
    Heic,
    Jp2,
}

impl ImageType {
    pub const ALL: [ImageType; 13] = [
        ImageType::Jpeg,
        ImageType::Png,
        ImageType::Gif,
        ImageType::WebP,
        ImageType::Avif,
        ImageType::Svg,
        ImageType::Bmp,
        ImageType::Ico,
        ImageType::Icns,
        ImageType::Tiff,
        ImageType::Jxl,
        ImageType::Heic,
        ImageType::Jp2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Avif => "avif",
            Self::Svg => "svg",
            Self::Bmp => "bmp",
            Self::Ico => "ico",
            Self::Icns => "icns",
            Self::Tiff => "tiff",
            Self::Jxl => "jxl",
            Self::Heic => "heic",
            Self::Jp2 => "jp2",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
            Self::Svg => "image/svg+xml",
            Self::Bmp => "image/bmp",
            Self::Ico => "image/x-icon",
            Self::Icns => "image/x-icns",
            Self::Tiff => "image/tiff",
            Self::Jxl => "image/jxl",
            Self::Heic => "image/heic",
            Self::Jp2 => "image/jp2",
        }
    }

    /// Formats that can carry more than one frame
    pub fn is_animatable(&self) -> bool {
        matches!(self, Self::WebP | Self::Png | Self::Gif)
    }

    /// Vector markup, never rasterized
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Svg)
    }

    /// Formats that are returned as-is instead of being re-encoded
    pub fn is_bypass(&self) -> bool {
        matches!(
            self,
            Self::Gif
                | Self::Bmp
                | Self::Ico
                | Self::Icns
                | Self::Tiff
                | Self::Jxl
                | Self::Heic
                | Self::Jp2
        )
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown image type: {}", s))
    }
}
