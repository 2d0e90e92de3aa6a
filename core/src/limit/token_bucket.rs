//! In-process token bucket
//!
//! Local fallback limiter with the same rate/burst parameters as the
//! Redis-backed token limiter. Decisions made here are per-process and
//! best-effort; the bucket exists so a store outage degrades service
//! instead of failing requests.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Continuous-refill token bucket
///
/// Holds up to `burst` tokens, refilling at `rate` tokens per second.
/// Thread-safe; a single instance is shared by all callers of a limiter.
#[derive(Debug)]
pub struct TokenBucket {
    /// Refill rate in tokens per second
    rate: f64,
    /// Bucket capacity
    burst: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    /// Remaining fractional tokens
    tokens: f64,
    /// Last refill time, fractional epoch seconds
    last_refill: f64,
}

impl TokenBucket {
    /// Create a full bucket with the given refill rate and capacity
    pub fn new(rate: u32, burst: u32) -> Self {
        Self {
            rate: f64::from(rate),
            burst: f64::from(burst),
            state: Mutex::new(BucketState {
                tokens: f64::from(burst),
                last_refill: 0.0,
            }),
        }
    }

    /// Take one token at the current time
    pub fn allow(&self) -> bool {
        self.allow_n(1)
    }

    /// Take `n` tokens at the current time
    pub fn allow_n(&self, n: u32) -> bool {
        self.allow_at(now_epoch_seconds(), n)
    }

    /// Take `n` tokens at an explicit time (fractional epoch seconds)
    ///
    /// Time moving backwards is treated as "no time elapsed"; the bucket
    /// never un-refills.
    pub fn allow_at(&self, now_secs: f64, n: u32) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if now_secs > state.last_refill {
            let elapsed = now_secs - state.last_refill;
            state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
            state.last_refill = now_secs;
        }

        let requested = f64::from(n);
        if state.tokens >= requested {
            state.tokens -= requested;
            true
        } else {
            false
        }
    }

    /// Refill rate in tokens per second
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Bucket capacity
    pub fn burst(&self) -> f64 {
        self.burst
    }
}

/// Current time as fractional seconds since the Unix epoch
fn now_epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
