//! Redis-backed limiters
//!
//! Each limiter executes its state transition as a single embedded Lua
//! script, so the whole check-and-mutate sequence is one indivisible
//! operation on the store. Client-side read-modify-write is deliberately
//! absent; it would reintroduce the races the scripts exist to avoid.

pub mod period;
pub mod period_failure;
pub mod token;

#[cfg(test)]
mod tests;

pub use period::PeriodLimit;
pub use period_failure::PeriodFailureLimit;
pub use token::TokenLimit;

// Re-export the result states alongside the limiters
pub use le_core::limit::{PeriodFailureState, PeriodLimitState};

/// Store reply for `TTL` on a missing key
pub const TTL_KEY_NOT_FOUND: i64 = -2;

/// Store reply for `TTL` on a key without expiry
pub const TTL_NO_EXPIRY: i64 = -1;

/// Lua script: force a counter to its quota without shortening or extending
/// the remaining window. Values already at or above quota are left alone.
pub(crate) const SET_QUOTA_FULL_SCRIPT: &str = r#"local quota = tonumber(ARGV[1])
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current < quota then
    redis.call('SET', KEYS[1], quota, 'KEEPTTL')
end
return 1"#;

/// Decode an integer script reply, `None` on any other reply shape
pub(crate) fn reply_as_int(value: &redis::Value) -> Option<i64> {
    match value {
        redis::Value::Int(code) => Some(*code),
        _ => None,
    }
}

/// Decode a boolean script reply
///
/// Lua `false` arrives as a nil reply and Lua `true` as integer 1;
/// anything else is outside the script contract.
pub(crate) fn reply_as_bool(value: &redis::Value) -> Option<bool> {
    match value {
        redis::Value::Nil => Some(false),
        redis::Value::Int(code) => Some(*code == 1),
        _ => None,
    }
}

/// Normalize a key prefix so it always ends in `:`
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with(':') {
        prefix.to_string()
    } else {
        format!("{}:", prefix)
    }
}
