// Optimization result serialization for the queue/result-store boundary
//
// Layout (big-endian, every field always present, in this order):
//
//   [u64 image length][image bytes]
//   [u64 content type length, 0 if absent][content type UTF-8]
//   [u64 cache control length, 0 if absent][cache control UTF-8]
//
// No padding, no version marker. An absent string and an empty string both
// encode as length 0 and decode as absent.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::OptimizeError;
use crate::image_optimizer::OptimizationResult;

/// Size of each length prefix
const LENGTH_PREFIX_SIZE: usize = 8;

/// Largest accepted field length (2^53 - 1)
pub const MAX_FIELD_LENGTH: u64 = (1 << 53) - 1;

const IMAGE_BUFFER: &str = "image buffer";
const CONTENT_TYPE: &str = "content type";
const CACHE_CONTROL: &str = "cache control";

/// Serializes an OptimizationResult into a single blob
///
/// The output is allocated once at its exact final size.
pub fn serialize_result(result: &OptimizationResult) -> Bytes {
    let content_type = result.content_type.as_deref().unwrap_or_default().as_bytes();
    let cache_control = result.cache_control.as_deref().unwrap_or_default().as_bytes();

    let total = 3 * LENGTH_PREFIX_SIZE + result.buffer.len() + content_type.len() + cache_control.len();
    let mut out = BytesMut::with_capacity(total);

    for field in [result.buffer.as_ref(), content_type, cache_control] {
        out.put_u64(field.len() as u64);
        out.put_slice(field);
    }

    debug_assert_eq!(out.len(), total);
    out.freeze()
}

/// Deserializes a blob produced by [`serialize_result`]
///
/// The image buffer is a zero-copy slice of `blob`.
///
/// # Errors
///
/// Returns `OptimizeError::MalformedPayload` if, for any field:
/// - fewer than 8 bytes remain for its length prefix
/// - the declared length exceeds 2^53 - 1
/// - the declared length runs past the end of the blob
///
/// or if a string field is not UTF-8, or bytes remain after the last field.
pub fn deserialize_result(blob: Bytes) -> Result<OptimizationResult, OptimizeError> {
    let mut reader = FieldReader::new(&blob);

    let buffer = reader.read_field(IMAGE_BUFFER)?;
    let content_type = optional_string(reader.read_field(CONTENT_TYPE)?, CONTENT_TYPE)?;
    let cache_control = optional_string(reader.read_field(CACHE_CONTROL)?, CACHE_CONTROL)?;

    if reader.cursor != blob.len() {
        return Err(OptimizeError::malformed("trailing bytes found"));
    }

    Ok(OptimizationResult {
        buffer,
        content_type,
        cache_control,
    })
}

/// Sequential reader over length-prefixed fields
struct FieldReader<'a> {
    blob: &'a Bytes,
    cursor: usize,
}

impl<'a> FieldReader<'a> {
    fn new(blob: &'a Bytes) -> Self {
        Self { blob, cursor: 0 }
    }

    fn remaining(&self) -> usize {
        self.blob.len() - self.cursor
    }

    fn read_field(&mut self, name: &str) -> Result<Bytes, OptimizeError> {
        if self.remaining() < LENGTH_PREFIX_SIZE {
            return Err(OptimizeError::malformed(format!("missing {} length", name)));
        }

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&self.blob[self.cursor..self.cursor + LENGTH_PREFIX_SIZE]);
        self.cursor += LENGTH_PREFIX_SIZE;

        let declared = u64::from_be_bytes(prefix);
        let too_large = || OptimizeError::malformed(format!("{} length is too large", name));
        if declared > MAX_FIELD_LENGTH {
            return Err(too_large());
        }
        let length = usize::try_from(declared).map_err(|_| too_large())?;

        if length > self.remaining() {
            return Err(OptimizeError::malformed(format!(
                "{} length exceeds total buffer size",
                name
            )));
        }

        let field = self.blob.slice(self.cursor..self.cursor + length);
        self.cursor += length;
        Ok(field)
    }
}

/// Zero length decodes as absent
fn optional_string(bytes: Bytes, name: &str) -> Result<Option<String>, OptimizeError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|_| OptimizeError::malformed(format!("{} is not valid UTF-8", name)))
}
