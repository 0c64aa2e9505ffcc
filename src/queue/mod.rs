//! Queue boundary
//!
//! Optimization work runs behind a job queue. A job carries only the fetch
//! parameters; its result travels back through a [`ResultStore`] as an opaque
//! blob produced by [`serialization::serialize_result`].
//!
//! - `MemoryResultStore`: moka-backed, single process
//! - `RedisResultStore`: shared between producers and workers

pub mod memory;
pub mod redis;
pub mod serialization;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::QueueConfig;
use crate::error::OptimizeError;
use crate::image_optimizer::{ImageFetcher, OptimizationResult};

pub use self::memory::MemoryResultStore;
pub use self::redis::RedisResultStore;
pub use self::serialization::{deserialize_result, serialize_result};

/// Job payload placed on the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeJob {
    pub url: String,
    pub width: u32,
    pub quality: u8,
    #[serde(default)]
    pub allow_svg: bool,
}

impl OptimizeJob {
    pub fn to_json(&self) -> Result<String, OptimizeError> {
        serde_json::to_string(self)
            .map_err(|e| OptimizeError::malformed(format!("invalid job payload: {}", e)))
    }

    pub fn from_json(payload: &str) -> Result<Self, OptimizeError> {
        serde_json::from_str(payload)
            .map_err(|e| OptimizeError::malformed(format!("invalid job payload: {}", e)))
    }
}

/// Generate a fresh job identifier
pub fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Storage for serialized results, keyed by job id
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Store a blob, overwriting any previous blob for the job
    async fn put(&self, job_id: &str, blob: Bytes) -> Result<(), OptimizeError>;

    /// Load a blob; `None` if missing or expired
    async fn get(&self, job_id: &str) -> Result<Option<Bytes>, OptimizeError>;

    /// Delete a blob; returns true if it existed
    async fn remove(&self, job_id: &str) -> Result<bool, OptimizeError>;
}

/// Open the store named by the configuration: Redis when a URL is set,
/// in-memory otherwise
pub async fn connect_store(config: &QueueConfig) -> Result<Arc<dyn ResultStore>, OptimizeError> {
    match config.redis_url {
        Some(_) => Ok(Arc::new(RedisResultStore::connect(config).await?)),
        None => {
            tracing::info!("No redis_url configured, using in-memory result store");
            Ok(Arc::new(MemoryResultStore::new(config)))
        }
    }
}

/// Runs jobs and moves their results through a store
#[derive(Clone)]
pub struct Worker {
    fetcher: ImageFetcher,
    store: Arc<dyn ResultStore>,
    max_width: u32,
}

impl Worker {
    pub fn new(fetcher: ImageFetcher, store: Arc<dyn ResultStore>) -> Self {
        Self {
            fetcher,
            store,
            max_width: u32::MAX,
        }
    }

    /// Reject jobs wider than `max_width`
    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    /// Fetch and optimize the job's image, then store the serialized result
    ///
    /// Running the same job twice overwrites the first result.
    pub async fn run_job(&self, job_id: &str, job: &OptimizeJob) -> Result<(), OptimizeError> {
        if job.width > self.max_width {
            return Err(OptimizeError::invalid_param(
                "width",
                format!("must be at most {}", self.max_width),
            ));
        }

        let result = self
            .fetcher
            .fetch_and_optimize(&job.url, job.width, job.quality, job.allow_svg)
            .await
            .map_err(|e| {
                tracing::warn!(job_id, error = %e, kind = %e.kind(), "Job failed");
                e
            })?;

        let blob = serialize_result(&result);
        tracing::debug!(job_id, len = blob.len(), "Storing job result");
        self.store.put(job_id, blob).await
    }

    /// Load, decode and delete a job's result
    ///
    /// Returns `None` when no result is stored. A blob that fails to decode
    /// is left in place.
    pub async fn take_result(&self, job_id: &str) -> Result<Option<OptimizationResult>, OptimizeError> {
        let Some(blob) = self.store.get(job_id).await? else {
            return Ok(None);
        };

        let result = deserialize_result(blob).map_err(|e| {
            tracing::warn!(job_id, reason = e.reason().unwrap_or_default(), "Failed to decode job result");
            e
        })?;

        self.store.remove(job_id).await?;
        Ok(Some(result))
    }
}
