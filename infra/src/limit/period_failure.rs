//! Failure-count limiter
//!
//! Counts only failed attempts per key within a fixed window. A success
//! while under quota wipes the failure history; a success once the quota is
//! exhausted changes nothing — the key stays locked until an explicit
//! [`PeriodFailureLimit::del`] or natural expiry.

use std::sync::Arc;

use once_cell::sync::Lazy;
use redis::Script;
use tracing::debug;

use le_core::limit::PeriodFailureState;
use le_shared::config::limit::PeriodFailureLimitSettings;

use crate::cache::RedisClient;
use crate::limit::{normalize_prefix, reply_as_int, SET_QUOTA_FULL_SCRIPT};
use crate::{LimitError, LimitResult};

/// Lua script: record a success or failure against the failure counter.
///
/// Reply codes: 0 = success, 1 = in quota, 2 = over quota. On success the
/// record is deleted only while failures are under quota; an exhausted
/// quota ignores successes.
const PERIOD_FAILURE_SCRIPT: &str = r#"local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local success = tonumber(ARGV[3])
if success == 1 then
    local current = tonumber(redis.call('GET', KEYS[1]) or '0')
    if current < limit then
        redis.call('DEL', KEYS[1])
        return 0
    end
    return 2
end
local current = redis.call('INCRBY', KEYS[1], 1)
if current == 1 then
    redis.call('EXPIRE', KEYS[1], window)
end
if current <= limit then
    return 1
end
return 2"#;

static CHECK_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(PERIOD_FAILURE_SCRIPT));
static QUOTA_FULL_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(SET_QUOTA_FULL_SCRIPT));

/// Failure-only quota limiter
#[derive(Clone)]
pub struct PeriodFailureLimit {
    client: Arc<RedisClient>,
    period: i64,
    quota: i64,
    key_prefix: String,
}

impl PeriodFailureLimit {
    /// Create a new failure limiter
    pub fn new(client: Arc<RedisClient>, settings: PeriodFailureLimitSettings) -> Self {
        Self {
            client,
            period: settings.period_seconds,
            quota: settings.quota,
            key_prefix: normalize_prefix(&settings.key_prefix),
        }
    }

    /// Record the outcome of an attempt for `key`
    ///
    /// `success == true` clears the failure record while it is under quota
    /// but still reports [`PeriodFailureState::OverQuota`] for a key that is
    /// already locked out.
    pub async fn check(&self, key: &str, success: bool) -> LimitResult<PeriodFailureState> {
        let mut conn = self.client.get_connection();
        let reply: redis::Value = CHECK_SCRIPT
            .key(self.counter_key(key))
            .arg(self.quota)
            .arg(self.period)
            .arg(i32::from(success))
            .invoke_async(&mut conn)
            .await?;

        let code = reply_as_int(&reply).ok_or(LimitError::UnexpectedReply)?;
        match PeriodFailureState::from_script_code(code) {
            PeriodFailureState::Unknown => Err(LimitError::UnknownCode(code)),
            state => {
                debug!("failure limit check for '{}': {}", key, state);
                Ok(state)
            }
        }
    }

    /// Record the outcome of a fallible operation for `key`
    ///
    /// Convenience wrapper mapping `Ok` to a success check.
    pub async fn check_result<T, E>(
        &self,
        key: &str,
        result: &Result<T, E>,
    ) -> LimitResult<PeriodFailureState> {
        self.check(key, result.is_ok()).await
    }

    /// Force the failure counter for `key` to its quota, locking the key out
    /// without touching the remaining TTL
    pub async fn set_quota_full(&self, key: &str) -> LimitResult<()> {
        let mut conn = self.client.get_connection();
        let _: redis::Value = QUOTA_FULL_SCRIPT
            .key(self.counter_key(key))
            .arg(self.quota)
            .invoke_async(&mut conn)
            .await?;
        debug!("failure limit quota forced full for '{}'", key);
        Ok(())
    }

    /// Delete the failure record for `key`
    ///
    /// The only way out of an exhausted quota short of natural expiry.
    pub async fn del(&self, key: &str) -> LimitResult<bool> {
        self.client.delete(&self.counter_key(key)).await
    }

    /// Remaining window TTL in seconds, with the store's sentinel replies
    /// passed through (-2 missing key, -1 no expiry)
    pub async fn ttl(&self, key: &str) -> LimitResult<i64> {
        self.client.ttl(&self.counter_key(key)).await
    }

    /// Current failure count, or `None` if no record exists
    pub async fn get_int(&self, key: &str) -> LimitResult<Option<i64>> {
        self.client.get_i64(&self.counter_key(key)).await
    }

    fn counter_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}
