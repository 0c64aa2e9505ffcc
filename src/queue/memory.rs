//! In-process result store backed by moka
//!
//! Used when no Redis URL is configured, and by tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::config::QueueConfig;
use crate::error::OptimizeError;

use super::ResultStore;

/// Upper bound on stored results before moka starts evicting
const MAX_ENTRIES: u64 = 10_000;

/// MemoryResultStore wraps moka for the ResultStore trait
pub struct MemoryResultStore {
    cache: moka::future::Cache<String, Bytes>,
}

impl MemoryResultStore {
    pub fn new(config: &QueueConfig) -> Self {
        Self::with_ttl(Duration::from_secs(config.result_ttl_seconds))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let cache = moka::future::Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn put(&self, job_id: &str, blob: Bytes) -> Result<(), OptimizeError> {
        self.cache.insert(job_id.to_string(), blob).await;
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<Bytes>, OptimizeError> {
        Ok(self.cache.get(job_id).await)
    }

    async fn remove(&self, job_id: &str) -> Result<bool, OptimizeError> {
        Ok(self.cache.remove(job_id).await.is_some())
    }
}
