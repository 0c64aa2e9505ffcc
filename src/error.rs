//! Error types for optimization, fetch and result transport
//!
//! Every failure is local to a single request. Each variant carries its own
//! diagnostic fields; `context()` flattens them into key/value pairs for
//! structured logging.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Shared, cloneable error cause attached to codec and transport failures
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Stable classification of an [`OptimizeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    InvalidParameter,
    UnsupportedAnimated,
    SvgNotAllowed,
    UpstreamFetchFailed,
    Fetch,
    MalformedPayload,
    Codec,
    DependencyUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::UnsupportedAnimated => "unsupported_animated",
            ErrorKind::SvgNotAllowed => "svg_not_allowed",
            ErrorKind::UpstreamFetchFailed => "upstream_fetch_failed",
            ErrorKind::Fetch => "fetch",
            ErrorKind::MalformedPayload => "malformed_payload",
            ErrorKind::Codec => "codec",
            ErrorKind::DependencyUnavailable => "dependency_unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while optimizing an image or moving its result
/// across the queue boundary
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptimizeError {
    // === Client input ===
    /// Buffer matches no known image signature
    #[error("The requested resource isn't a valid image.")]
    InvalidInput,
    /// Request parameter out of range
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },
    /// Animated image submitted
    #[error("Animated images are not supported")]
    UnsupportedAnimated,
    /// SVG submitted without explicit allowance
    #[error("SVG images are not allowed")]
    SvgNotAllowed,

    // === Upstream ===
    /// Upstream answered with a non-2xx status
    #[error("Upstream responded with status {status}")]
    UpstreamFetchFailed { status: u16, body: String },
    /// Upstream could not be reached or its body could not be read
    #[error("Failed to fetch {url}: {cause}")]
    Fetch {
        url: String,
        #[source]
        cause: Cause,
    },

    // === Transport ===
    /// Result blob is structurally invalid
    #[error("Malformed payload: {reason}")]
    MalformedPayload { reason: String },
    /// Result store could not be located or connected to
    #[error("Dependency '{dependency}' is unavailable: {reason}")]
    DependencyUnavailable { dependency: String, reason: String },

    // === Codec ===
    /// Decode, resize or encode failed inside the image codec
    #[error("Image codec failed for {format}: {message}")]
    Codec {
        format: String,
        message: String,
        #[source]
        cause: Option<Cause>,
    },
}

impl OptimizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OptimizeError::InvalidInput => ErrorKind::InvalidInput,
            OptimizeError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            OptimizeError::UnsupportedAnimated => ErrorKind::UnsupportedAnimated,
            OptimizeError::SvgNotAllowed => ErrorKind::SvgNotAllowed,
            OptimizeError::UpstreamFetchFailed { .. } => ErrorKind::UpstreamFetchFailed,
            OptimizeError::Fetch { .. } => ErrorKind::Fetch,
            OptimizeError::MalformedPayload { .. } => ErrorKind::MalformedPayload,
            OptimizeError::DependencyUnavailable { .. } => ErrorKind::DependencyUnavailable,
            OptimizeError::Codec { .. } => ErrorKind::Codec,
        }
    }

    /// Maps errors to HTTP status codes
    ///
    /// Status mapping:
    /// - InvalidInput, InvalidParameter, UnsupportedAnimated, SvgNotAllowed → 400
    /// - UpstreamFetchFailed, Fetch → 502 (Bad Gateway)
    /// - MalformedPayload, Codec → 500
    /// - DependencyUnavailable → 503
    pub fn to_http_status(&self) -> u16 {
        match self {
            OptimizeError::InvalidInput
            | OptimizeError::InvalidParameter { .. }
            | OptimizeError::UnsupportedAnimated
            | OptimizeError::SvgNotAllowed => 400,

            OptimizeError::UpstreamFetchFailed { .. } | OptimizeError::Fetch { .. } => 502,

            OptimizeError::MalformedPayload { .. } | OptimizeError::Codec { .. } => 500,

            OptimizeError::DependencyUnavailable { .. } => 503,
        }
    }

    /// Whether the failure is caused by the request itself
    pub fn is_client_error(&self) -> bool {
        self.to_http_status() < 500
    }

    /// None of the failures are retried at this layer; retry policy belongs
    /// to the queue that delivered the job.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Diagnostic key/value pairs for structured logs
    pub fn context(&self) -> Vec<(&'static str, String)> {
        let mut ctx = vec![("kind", self.kind().as_str().to_string())];
        match self {
            OptimizeError::InvalidParameter { param, message } => {
                ctx.push(("param", param.clone()));
                ctx.push(("message", message.clone()));
            }
            OptimizeError::UpstreamFetchFailed { status, body } => {
                ctx.push(("status", status.to_string()));
                ctx.push(("body", body.clone()));
            }
            OptimizeError::Fetch { url, cause } => {
                ctx.push(("url", url.clone()));
                ctx.push(("cause", cause.to_string()));
            }
            OptimizeError::MalformedPayload { reason } => {
                ctx.push(("reason", reason.clone()));
            }
            OptimizeError::DependencyUnavailable { dependency, reason } => {
                ctx.push(("dependency", dependency.clone()));
                ctx.push(("reason", reason.clone()));
            }
            OptimizeError::Codec {
                format,
                message,
                cause,
            } => {
                ctx.push(("format", format.clone()));
                ctx.push(("message", message.clone()));
                if let Some(cause) = cause {
                    ctx.push(("cause", cause.to_string()));
                }
            }
            OptimizeError::InvalidInput
            | OptimizeError::UnsupportedAnimated
            | OptimizeError::SvgNotAllowed => {}
        }
        ctx
    }

    /// Reason string of a `MalformedPayload` error
    pub fn reason(&self) -> Option<&str> {
        match self {
            OptimizeError::MalformedPayload { reason } => Some(reason),
            _ => None,
        }
    }

    // Helper constructors for common error patterns

    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        OptimizeError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        OptimizeError::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub fn codec(format: impl Into<String>, message: impl Into<String>) -> Self {
        OptimizeError::Codec {
            format: format.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn codec_with_cause<E>(format: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        OptimizeError::Codec {
            format: format.into(),
            message: cause.to_string(),
            cause: Some(Arc::new(cause)),
        }
    }

    pub fn fetch<E>(url: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        OptimizeError::Fetch {
            url: url.into(),
            cause: Arc::new(cause),
        }
    }

    pub fn dependency_unavailable(dependency: impl Into<String>, reason: impl Into<String>) -> Self {
        OptimizeError::DependencyUnavailable {
            dependency: dependency.into(),
            reason: reason.into(),
        }
    }
}
