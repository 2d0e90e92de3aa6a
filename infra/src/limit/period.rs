//! Fixed-window period limiter
//!
//! Allows up to `quota` requests per `period_seconds`, tracked by an
//! auto-expiring counter key. The TTL is armed exactly once, on the 0→1
//! transition, and covers the whole active window.

use std::sync::Arc;

use chrono::{Local, Offset};
use once_cell::sync::Lazy;
use redis::Script;
use tracing::debug;

use le_core::limit::PeriodLimitState;
use le_shared::config::limit::PeriodLimitSettings;

use crate::cache::RedisClient;
use crate::limit::{normalize_prefix, reply_as_int, SET_QUOTA_FULL_SCRIPT};
use crate::{LimitError, LimitResult};

/// Lua script: increment the window counter, arm the TTL on the first hit,
/// classify the result.
///
/// Reply codes: 0 = over quota, 1 = allowed, 2 = hit quota. The numbering
/// differs from the public state ordering on purpose; see
/// [`PeriodLimitState::from_script_code`].
const PERIOD_SCRIPT: &str = r#"local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local current = redis.call('INCRBY', KEYS[1], 1)
if current == 1 then
    redis.call('EXPIRE', KEYS[1], window)
end
if current < limit then
    return 1
elseif current == limit then
    return 2
else
    return 0
end"#;

static TAKE_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(PERIOD_SCRIPT));
static QUOTA_FULL_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(SET_QUOTA_FULL_SCRIPT));

/// Fixed-window request limiter
#[derive(Clone)]
pub struct PeriodLimit {
    client: Arc<RedisClient>,
    period: i64,
    quota: i64,
    key_prefix: String,
    align: bool,
}

impl PeriodLimit {
    /// Create a new period limiter
    pub fn new(client: Arc<RedisClient>, settings: PeriodLimitSettings) -> Self {
        Self {
            client,
            period: settings.period_seconds,
            quota: settings.quota,
            key_prefix: normalize_prefix(&settings.key_prefix),
            align: settings.align,
        }
    }

    /// Take one unit of quota for `key`
    ///
    /// Returns the window state after this request. Transport errors and
    /// out-of-contract script replies surface as errors; the counter is
    /// still advanced by the script in the reply-decoding case.
    pub async fn take(&self, key: &str) -> LimitResult<PeriodLimitState> {
        let mut conn = self.client.get_connection();
        let reply: redis::Value = TAKE_SCRIPT
            .key(self.counter_key(key))
            .arg(self.quota)
            .arg(self.window_seconds())
            .invoke_async(&mut conn)
            .await?;

        let code = reply_as_int(&reply).ok_or(LimitError::UnexpectedReply)?;
        match PeriodLimitState::from_script_code(code) {
            PeriodLimitState::Unknown => Err(LimitError::UnknownCode(code)),
            state => {
                debug!("period limit take for '{}': {}", key, state);
                Ok(state)
            }
        }
    }

    /// Force the counter for `key` to its quota
    ///
    /// Locks the key out for the remainder of its window without touching
    /// the TTL. A counter already at or above quota is left unchanged.
    pub async fn set_quota_full(&self, key: &str) -> LimitResult<()> {
        let mut conn = self.client.get_connection();
        let _: redis::Value = QUOTA_FULL_SCRIPT
            .key(self.counter_key(key))
            .arg(self.quota)
            .invoke_async(&mut conn)
            .await?;
        debug!("period limit quota forced full for '{}'", key);
        Ok(())
    }

    /// Delete the counter for `key`, resetting its window
    pub async fn del(&self, key: &str) -> LimitResult<bool> {
        self.client.delete(&self.counter_key(key)).await
    }

    /// Remaining window TTL in seconds, with the store's sentinel replies
    /// passed through (-2 missing key, -1 no expiry)
    pub async fn ttl(&self, key: &str) -> LimitResult<i64> {
        self.client.ttl(&self.counter_key(key)).await
    }

    /// Current counter value, or `None` if no window is active
    pub async fn get_int(&self, key: &str) -> LimitResult<Option<i64>> {
        self.client.get_i64(&self.counter_key(key)).await
    }

    fn counter_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// TTL to arm on a fresh counter
    fn window_seconds(&self) -> i64 {
        if !self.align {
            return self.period;
        }
        let now = Local::now();
        let offset = i64::from(now.offset().fix().local_minus_utc());
        aligned_window(self.period, now.timestamp(), offset)
    }
}

/// Seconds until the next local-time period boundary
///
/// With alignment the window does not run `period` seconds from "now" but
/// ends at the next multiple of `period` in local time, so a one-day period
/// means "per calendar day".
pub(crate) fn aligned_window(period: i64, now_unix: i64, utc_offset_secs: i64) -> i64 {
    period - ((now_unix + utc_offset_secs) % period)
}
