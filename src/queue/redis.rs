// Redis result store
//
// Blobs are stored under "{prefix}:result:{job_id}" with the configured TTL.
// The connection is established once in `connect`; a ConnectionManager
// handles reconnection afterwards.

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::config::QueueConfig;
use crate::error::OptimizeError;

use super::ResultStore;

const DEPENDENCY: &str = "redis";

/// Redis-backed result store shared by producers and workers
#[derive(Clone)]
pub struct RedisResultStore {
    /// Redis connection manager (async, multiplexed)
    connection: ConnectionManager,
    key_prefix: String,
    ttl_seconds: u64,
}

impl RedisResultStore {
    /// Connect to Redis
    ///
    /// # Errors
    ///
    /// Returns `DependencyUnavailable` if:
    /// - `redis_url` is not set
    /// - the URL is invalid
    /// - the server cannot be reached
    pub async fn connect(config: &QueueConfig) -> Result<Self, OptimizeError> {
        let redis_url = config.redis_url.as_deref().ok_or_else(|| {
            OptimizeError::dependency_unavailable(DEPENDENCY, "redis_url is required")
        })?;

        let client = Client::open(redis_url).map_err(|e| {
            OptimizeError::dependency_unavailable(DEPENDENCY, format!("Invalid Redis URL: {}", e))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            OptimizeError::dependency_unavailable(
                DEPENDENCY,
                format!("Failed to connect to Redis: {}", e),
            )
        })?;

        tracing::info!(key_prefix = %config.key_prefix, "Connected to Redis result store");

        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
            ttl_seconds: config.result_ttl_seconds,
        })
    }

    fn key(&self, job_id: &str) -> String {
        result_key(&self.key_prefix, job_id)
    }
}

/// Formats the Redis key for a job's result
pub fn result_key(prefix: &str, job_id: &str) -> String {
    format!("{}:result:{}", prefix, job_id)
}

fn command_failed(e: redis::RedisError) -> OptimizeError {
    tracing::warn!(error = %e, "Redis command failed");
    OptimizeError::dependency_unavailable(DEPENDENCY, e.to_string())
}

#[async_trait]
impl ResultStore for RedisResultStore {
    async fn put(&self, job_id: &str, blob: Bytes) -> Result<(), OptimizeError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(self.key(job_id), blob.as_ref(), self.ttl_seconds)
            .await
            .map_err(command_failed)
    }

    async fn get(&self, job_id: &str) -> Result<Option<Bytes>, OptimizeError> {
        let mut conn = self.connection.clone();
        let blob: Option<Vec<u8>> = conn.get(self.key(job_id)).await.map_err(command_failed)?;
        Ok(blob.map(Bytes::from))
    }

    async fn remove(&self, job_id: &str) -> Result<bool, OptimizeError> {
        let mut conn = self.connection.clone();
        let removed: i64 = conn.del(self.key(job_id)).await.map_err(command_failed)?;
        Ok(removed > 0)
    }
}
