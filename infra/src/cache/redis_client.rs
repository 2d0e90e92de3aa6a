//! Redis cache client implementation
//!
//! This module provides the Redis client shared by all limiters. Connection
//! establishment retries with exponential backoff; individual operations do
//! not retry — a store error is surfaced to the caller on first failure, and
//! each limiter decides how to react to it.

use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use le_shared::config::cache::CacheConfig;

use crate::{LimitError, LimitResult};

/// Redis client with a multiplexed async connection
///
/// Cloning is cheap; all clones share the underlying connection.
#[derive(Clone)]
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// Create a new Redis client
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Example
    /// ```no_run
    /// use le_shared::config::cache::CacheConfig;
    /// use le_infra::cache::RedisClient;
    ///
    /// async fn create_client() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let config = CacheConfig::new("redis://localhost:6379");
    ///     let client = RedisClient::new(config).await?;
    ///     Ok(client)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> LimitResult<Self> {
        Self::new_with_retry_config(config, 3, 100).await
    }

    /// Create a new Redis client with custom connection retry settings
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    /// * `max_retries` - Maximum number of connection attempts
    /// * `retry_delay_ms` - Base delay between attempts in milliseconds
    pub async fn new_with_retry_config(
        config: CacheConfig,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> LimitResult<Self> {
        info!("Creating Redis client with URL: {}", mask_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            LimitError::Cache(e)
        })?;

        let connection =
            Self::create_connection_with_retry(client, max_retries, retry_delay_ms).await?;

        info!("Redis client created successfully");

        Ok(Self { connection })
    }

    /// Create the multiplexed connection with retry logic
    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> LimitResult<MultiplexedConnection> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            match client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    // Exponential backoff with cap at 5 seconds
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(LimitError::Cache(e));
                }
            }
        }
    }

    /// Get a handle to the shared connection
    pub fn get_connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Check if the Redis connection is healthy
    ///
    /// Performs a PING command to verify connectivity.
    pub async fn health_check(&self) -> LimitResult<bool> {
        let mut conn = self.get_connection();
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response == "PONG")
    }

    /// Get an integer value, or `None` if the key does not exist
    pub async fn get_i64(&self, key: &str) -> LimitResult<Option<i64>> {
        let mut conn = self.get_connection();
        let value: Option<i64> = conn.get(key).await?;
        Ok(value)
    }

    /// Delete a key
    ///
    /// Returns `true` if the key existed.
    pub async fn delete(&self, key: &str) -> LimitResult<bool> {
        let mut conn = self.get_connection();
        let deleted: i64 = conn.del(key).await?;
        if deleted > 0 {
            debug!("Deleted key '{}'", key);
        }
        Ok(deleted > 0)
    }

    /// Get the time-to-live of a key in seconds
    ///
    /// The store's sentinel replies are passed through unchanged:
    /// -2 when the key does not exist, -1 when it exists without expiry.
    pub async fn ttl(&self, key: &str) -> LimitResult<i64> {
        let mut conn = self.get_connection();
        let ttl: i64 = conn.ttl(key).await?;
        Ok(ttl)
    }

    /// Check if a key exists
    pub async fn exists(&self, key: &str) -> LimitResult<bool> {
        let mut conn = self.get_connection();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }
}

/// Mask sensitive parts of a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}
