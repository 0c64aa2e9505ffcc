//! Fetch-and-optimize
//!
//! Performs one HTTP GET, runs the optimization policy on the body and
//! carries the upstream `Content-Type` and `Cache-Control` headers through
//! verbatim.
//!
//! No timeout or retry is applied here; dropping the returned future aborts
//! the request. Both belong to the caller (usually the job queue).

use reqwest::header::{HeaderMap, HeaderName, CACHE_CONTROL, CONTENT_TYPE};

use crate::error::OptimizeError;

use super::policy::{OptimizationRequest, OptimizationResult, Optimizer};

/// HTTP client bound to an optimizer
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    http_client: reqwest::Client,
    optimizer: Optimizer,
}

impl ImageFetcher {
    /// Create a fetcher with a default HTTP client
    ///
    /// # Errors
    ///
    /// Returns `DependencyUnavailable` if the HTTP client cannot be created
    /// (e.g., TLS backend initialization failure).
    pub fn new(optimizer: Optimizer) -> Result<Self, OptimizeError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| OptimizeError::dependency_unavailable("http client", e.to_string()))?;

        Ok(Self::with_client(http_client, optimizer))
    }

    pub fn with_client(http_client: reqwest::Client, optimizer: Optimizer) -> Self {
        Self {
            http_client,
            optimizer,
        }
    }

    /// Fetch `url` and optimize the response body
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for a zero width or out-of-range quality, before
    ///   any request is sent
    /// - `Fetch` if the request cannot be sent or the body cannot be read
    /// - `UpstreamFetchFailed` for a non-2xx response, with its status and body
    /// - any error from [`Optimizer::optimize`]
    pub async fn fetch_and_optimize(
        &self,
        url: &str,
        width: u32,
        quality: u8,
        allow_svg: bool,
    ) -> Result<OptimizationResult, OptimizeError> {
        OptimizationRequest::validate_params(width, quality)?;

        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "Upstream request failed");
            OptimizeError::fetch(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url, status = status.as_u16(), "Upstream returned an error status");
            return Err(OptimizeError::UpstreamFetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = header_value(response.headers(), &CONTENT_TYPE);
        let cache_control = header_value(response.headers(), &CACHE_CONTROL);

        let body = response
            .bytes()
            .await
            .map_err(|e| OptimizeError::fetch(url, e))?;

        tracing::debug!(url, len = body.len(), "Fetched upstream image");

        let request = OptimizationRequest::new(body, width, quality, allow_svg)?;
        let buffer = self.optimizer.optimize(&request)?;

        Ok(OptimizationResult {
            buffer,
            content_type,
            cache_control,
        })
    }
}

/// Header value as sent by upstream; `None` when the header is missing
fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}
