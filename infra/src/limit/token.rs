//! Token-bucket limiter with in-process fallback
//!
//! The bucket state lives in Redis as a `tokens`/`ts` key pair so that all
//! instances sharing a key draw from the same bucket. When Redis becomes
//! unreachable the limiter answers from a local [`TokenBucket`] with the
//! same parameters and starts a single recovery monitor that restores
//! remote mode once the store responds to a health probe. Store errors are
//! never surfaced to callers; availability wins over strict accuracy during
//! an outage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use redis::{RedisResult, Script};
use tracing::{error, info, warn};

use le_core::limit::TokenBucket;
use le_shared::config::limit::TokenLimitSettings;

use crate::cache::RedisClient;
use crate::limit::reply_as_bool;

/// Interval between health probes while degraded
const PING_INTERVAL: Duration = Duration::from_millis(100);

/// Lua script: refill the bucket from the elapsed time, then try to take
/// `requested` tokens.
///
/// Both keys are re-written with a TTL of twice the full-refill time on
/// every call, so idle buckets expire instead of lingering. Replies with
/// Lua true/false (integer-1/nil on the wire).
const TOKEN_SCRIPT: &str = r#"local rate = tonumber(ARGV[1])
local capacity = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local requested = tonumber(ARGV[4])
local fill_time = capacity / rate
local ttl = math.floor(fill_time * 2)
local last_tokens = tonumber(redis.call('GET', KEYS[1]))
if last_tokens == nil then
    last_tokens = capacity
end
local last_refreshed = tonumber(redis.call('GET', KEYS[2]))
if last_refreshed == nil then
    last_refreshed = 0
end
local delta = math.max(0, now - last_refreshed)
local filled_tokens = math.min(capacity, last_tokens + (delta * rate))
local allowed = filled_tokens >= requested
local new_tokens = filled_tokens
if allowed then
    new_tokens = filled_tokens - requested
end
redis.call('SETEX', KEYS[1], ttl, new_tokens)
redis.call('SETEX', KEYS[2], ttl, now)
return allowed"#;

static ALLOW_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(TOKEN_SCRIPT));

/// Token-bucket limiter backed by Redis with a local degraded mode
#[derive(Clone)]
pub struct TokenLimit {
    client: Arc<RedisClient>,
    rate: u32,
    burst: u32,
    tokens_key: String,
    timestamp_key: String,
    /// Whether the store answered the most recent call; shared by all clones
    redis_alive: Arc<AtomicBool>,
    /// Single-flight guard for the recovery monitor
    monitor_started: Arc<AtomicBool>,
    /// Local stand-in bucket used while degraded
    fallback: Arc<TokenBucket>,
}

impl TokenLimit {
    /// Create a new token limiter
    pub fn new(client: Arc<RedisClient>, settings: TokenLimitSettings) -> Self {
        let (tokens_key, timestamp_key) = bucket_keys(&settings.key);
        Self {
            client,
            rate: settings.rate,
            burst: settings.burst,
            tokens_key,
            timestamp_key,
            redis_alive: Arc::new(AtomicBool::new(true)),
            monitor_started: Arc::new(AtomicBool::new(false)),
            fallback: Arc::new(TokenBucket::new(settings.rate, settings.burst)),
        }
    }

    /// Take one token now
    pub async fn allow(&self) -> bool {
        self.allow_n(Utc::now(), 1).await
    }

    /// Take `n` tokens at `now`
    ///
    /// Never returns an error: a failing store downgrades to the local
    /// bucket for this and subsequent calls until the monitor restores
    /// remote mode.
    pub async fn allow_n(&self, now: DateTime<Utc>, n: u32) -> bool {
        if !self.redis_alive.load(Ordering::Acquire) {
            return self.local_allow(now, n);
        }

        let mut conn = self.client.get_connection();
        let result: RedisResult<redis::Value> = ALLOW_SCRIPT
            .key(&self.tokens_key)
            .key(&self.timestamp_key)
            .arg(self.rate)
            .arg(self.burst)
            .arg(now.timestamp())
            .arg(n)
            .invoke_async(&mut conn)
            .await;

        match result {
            Ok(reply) => match reply_as_bool(&reply) {
                Some(allowed) => allowed,
                None => {
                    warn!("token limiter got an undecodable reply: {:?}", reply);
                    self.degrade();
                    self.local_allow(now, n)
                }
            },
            Err(e) => {
                error!("token limiter script failed: {}", e);
                self.degrade();
                self.local_allow(now, n)
            }
        }
    }

    /// Whether the limiter currently consults the shared store
    pub fn is_redis_alive(&self) -> bool {
        self.redis_alive.load(Ordering::Acquire)
    }

    fn local_allow(&self, now: DateTime<Utc>, n: u32) -> bool {
        let now_secs = now.timestamp_millis() as f64 / 1000.0;
        self.fallback.allow_at(now_secs, n)
    }

    fn degrade(&self) {
        self.redis_alive.store(false, Ordering::Release);
        self.start_monitor();
    }

    /// Start the recovery monitor if it is not already running
    ///
    /// The compare-and-swap guarantees at most one monitor per limiter
    /// instance no matter how many callers race into the fallback path.
    fn start_monitor(&self) {
        if self
            .monitor_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        info!("token limiter degraded to in-process bucket, starting recovery monitor");
        let client = Arc::clone(&self.client);
        let redis_alive = Arc::clone(&self.redis_alive);
        let monitor_started = Arc::clone(&self.monitor_started);

        tokio::spawn(async move {
            let mut probe = tokio::time::interval(PING_INTERVAL);
            loop {
                probe.tick().await;
                if matches!(client.health_check().await, Ok(true)) {
                    redis_alive.store(true, Ordering::Release);
                    monitor_started.store(false, Ordering::Release);
                    info!("store recovered, token limiter back to remote mode");
                    break;
                }
            }
        });
    }
}

/// Key pair holding the bucket state
///
/// The braces keep both keys in the same hash slot on clustered stores.
pub(crate) fn bucket_keys(key: &str) -> (String, String) {
    (format!("{{{}}}.tokens", key), format!("{{{}}}.ts", key))
}
