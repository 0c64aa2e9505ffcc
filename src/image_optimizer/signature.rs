//! Binary signature registry and type detection
//!
//! Untrusted buffers are classified purely by their leading bytes; no
//! decoder ever sees data that failed to match here.
//!
//! Entries are tested in registration order and the first full match wins,
//! so an entry that could be confused with a more generic one must be
//! registered before it. A tag may name an alias within a family using
//! `_` as separator (`svg_xml`, `svg_tag`); only the family prefix is
//! reported.

use super::format::ImageType;

/// Separator between a family name and its alias suffix
pub const FAMILY_SEPARATOR: char = '_';

/// One position of a signature pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternByte {
    Exact(u8),
    /// Any value matches
    Any,
}

/// A tagged byte pattern anchored at offset 0
#[derive(Debug, Clone, Copy)]
pub struct SignatureEntry {
    pub tag: &'static str,
    pub pattern: &'static [PatternByte],
}

impl SignatureEntry {
    /// The reported type name: the tag up to the first separator
    pub fn family(&self) -> &'static str {
        match self.tag.split_once(FAMILY_SEPARATOR) {
            Some((family, _)) => family,
            None => self.tag,
        }
    }

    /// Whether `data` starts with this pattern
    pub fn matches(&self, data: &[u8]) -> bool {
        if data.len() < self.pattern.len() {
            return false;
        }

        self.pattern
            .iter()
            .zip(data)
            .all(|(expected, actual)| match expected {
                PatternByte::Exact(b) => b == actual,
                PatternByte::Any => true,
            })
    }
}

macro_rules! pattern {
    (@byte _) => {
        PatternByte::Any
    };
    (@byte $b:literal) => {
        PatternByte::Exact($b)
    };
    ($($b:tt),* $(,)?) => {
        &[$(pattern!(@byte $b)),*]
    };
}

/// Process-wide signature table
pub static SIGNATURES: &[SignatureEntry] = &[
    // ISO-BMFF brands share the `....ftyp` box header
    SignatureEntry {
        tag: "avif",
        pattern: pattern![0x00, 0x00, 0x00, _, 0x66, 0x74, 0x79, 0x70, 0x61, 0x76, 0x69, 0x66],
    },
    SignatureEntry {
        tag: "avif_sequence",
        pattern: pattern![0x00, 0x00, 0x00, _, 0x66, 0x74, 0x79, 0x70, 0x61, 0x76, 0x69, 0x73],
    },
    SignatureEntry {
        tag: "heic",
        pattern: pattern![0x00, 0x00, 0x00, _, 0x66, 0x74, 0x79, 0x70, 0x68, 0x65, 0x69, 0x63],
    },
    SignatureEntry {
        tag: "jxl_container",
        pattern: pattern![0x00, 0x00, 0x00, 0x0C, 0x4A, 0x58, 0x4C, 0x20, 0x0D, 0x0A, 0x87, 0x0A],
    },
    SignatureEntry {
        tag: "jp2",
        pattern: pattern![0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A],
    },
    SignatureEntry {
        tag: "webp",
        pattern: pattern![0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50],
    },
    SignatureEntry {
        tag: "png",
        pattern: pattern![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
    },
    SignatureEntry {
        tag: "jpeg",
        pattern: pattern![0xFF, 0xD8, 0xFF],
    },
    SignatureEntry {
        tag: "jxl_codestream",
        pattern: pattern![0xFF, 0x0A],
    },
    SignatureEntry {
        tag: "gif",
        pattern: pattern![0x47, 0x49, 0x46, 0x38],
    },
    // "<?xml" and "<svg"
    SignatureEntry {
        tag: "svg_xml",
        pattern: pattern![0x3C, 0x3F, 0x78, 0x6D, 0x6C],
    },
    SignatureEntry {
        tag: "svg_tag",
        pattern: pattern![0x3C, 0x73, 0x76, 0x67],
    },
    SignatureEntry {
        tag: "icns",
        pattern: pattern![0x69, 0x63, 0x6E, 0x73],
    },
    SignatureEntry {
        tag: "ico",
        pattern: pattern![0x00, 0x00, 0x01, 0x00],
    },
    SignatureEntry {
        tag: "tiff_le",
        pattern: pattern![0x49, 0x49, 0x2A, 0x00],
    },
    SignatureEntry {
        tag: "tiff_be",
        pattern: pattern![0x4D, 0x4D, 0x00, 0x2A],
    },
    SignatureEntry {
        tag: "bmp",
        pattern: pattern![0x42, 0x4D],
    },
];

/// Family name of the first entry in `registry` matching `data`
pub fn detect_family_in(registry: &[SignatureEntry], data: &[u8]) -> Option<&'static str> {
    registry
        .iter()
        .find(|entry| entry.matches(data))
        .map(SignatureEntry::family)
}

/// Family name of the first registered signature matching `data`
pub fn detect_family(data: &[u8]) -> Option<&'static str> {
    detect_family_in(SIGNATURES, data)
}

/// Classify `data` by signature; `None` when nothing matches
pub fn detect(data: &[u8]) -> Option<ImageType> {
    detect_family(data).and_then(|family| family.parse().ok())
}
