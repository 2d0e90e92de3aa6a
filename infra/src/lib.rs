//! # LimitEasy Infrastructure
//!
//! Redis-backed rate limiting for LimitEasy services. Every limiter in this
//! crate follows the same pattern: an atomic check-and-update executed as a
//! server-side Lua script against a shared counter store, so that no two
//! concurrent callers can observe an inconsistent intermediate state for the
//! same key.
//!
//! ## Limiters
//!
//! - [`limit::PeriodLimit`]: fixed-window request counter
//! - [`limit::PeriodFailureLimit`]: failure-only quota with
//!   lockout-until-reset semantics
//! - [`limit::TokenLimit`]: token bucket with an in-process fallback while
//!   Redis is unreachable
//! - [`verification::VerificationLimit`]: send/verify throttling for
//!   verification codes

// Re-export core types for convenience
pub use le_core::errors::*;
pub use le_core::limit::{PeriodFailureState, PeriodLimitState, TokenBucket};

/// Cache module - Redis client and connection management
pub mod cache;

/// Limit module - period, failure and token-bucket limiters
pub mod limit;

/// Verification module - send/verify code throttling
pub mod verification;

/// Configuration re-exports for infrastructure consumers
pub mod config {
    pub use le_shared::config::cache::CacheConfig;
    pub use le_shared::config::limit::{
        LimitConfig, PeriodFailureLimitSettings, PeriodLimitSettings, TokenLimitSettings,
        VerificationSettings,
    };
}

pub use le_core::errors::VerifyError;

/// Limiter error types
#[derive(Debug, thiserror::Error)]
pub enum LimitError {
    /// Transport or store-side error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// The script replied with an integer outside its documented contract.
    /// Indicates a script/client version mismatch, never retried.
    #[error("Unknown script reply code: {0}")]
    UnknownCode(i64),

    /// The script replied with a non-integer value
    #[error("Unexpected script reply type")]
    UnexpectedReply,

    /// The code delivery provider failed after the accounting commit
    #[error("Code provider error: {0}")]
    Provider(String),

    /// Domain outcome of the verification protocol
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl LimitError {
    /// The verification domain outcome, if this error carries one
    pub fn as_verify(&self) -> Option<VerifyError> {
        match self {
            Self::Verify(e) => Some(*e),
            _ => None,
        }
    }
}

pub type LimitResult<T> = Result<T, LimitError>;
