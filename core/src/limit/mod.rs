//! Limiter domain types
//!
//! Result states for the Redis-backed limiters and the in-process token
//! bucket used while the store is unreachable.

pub mod state;
pub mod token_bucket;

#[cfg(test)]
mod tests;

pub use state::{PeriodFailureState, PeriodLimitState};
pub use token_bucket::TokenBucket;
