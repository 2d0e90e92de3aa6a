//! Integration tests for the token-bucket limiter
//!
//! These tests require Redis to be running locally on port 6379.
//! Run with: cargo test --test token_limit_integration -- --ignored

use std::sync::Arc;

use tokio::time::{sleep, Duration};

use le_infra::cache::RedisClient;
use le_infra::config::{CacheConfig, TokenLimitSettings};
use le_infra::limit::TokenLimit;

/// Helper to create a test limiter with custom settings
async fn create_test_limiter(settings: TokenLimitSettings) -> TokenLimit {
    let client = RedisClient::new(CacheConfig::new("redis://localhost:6379"))
        .await
        .expect("Failed to create Redis client");
    TokenLimit::new(Arc::new(client), settings)
}

fn random_bucket(tag: &str) -> String {
    format!("test:token:{}:{}", tag, rand::random::<u32>())
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_burst_then_deny() {
    let limiter = create_test_limiter(TokenLimitSettings {
        rate: 5,
        burst: 10,
        key: random_bucket("burst"),
    })
    .await;

    for i in 0..10 {
        assert!(limiter.allow().await, "token {} of the burst should pass", i + 1);
    }
    assert!(!limiter.allow().await, "11th instantaneous request must be denied");
    assert!(limiter.is_redis_alive());
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_refill_after_waiting() {
    let limiter = create_test_limiter(TokenLimitSettings {
        rate: 5,
        burst: 10,
        key: random_bucket("refill"),
    })
    .await;

    for _ in 0..10 {
        assert!(limiter.allow().await);
    }
    assert!(!limiter.allow().await);

    // one second refills rate tokens (the script works in whole seconds)
    sleep(Duration::from_millis(1100)).await;
    for i in 0..5 {
        assert!(limiter.allow().await, "refilled token {} should pass", i + 1);
    }
    assert!(!limiter.allow().await);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_store_error_degrades_to_local_bucket() {
    // burst/rate under one second floors the script TTL to zero, which
    // SETEX rejects - a store-side error on an otherwise healthy server
    let limiter = create_test_limiter(TokenLimitSettings {
        rate: 5,
        burst: 2,
        key: random_bucket("degraded"),
    })
    .await;

    // the failing script must not surface an error; the local bucket answers
    assert!(limiter.allow().await);
    assert!(!limiter.is_redis_alive());

    // the bucket keeps limiting while degraded
    assert!(limiter.allow().await);
    assert!(!limiter.allow().await);

    // the recovery monitor's health probe succeeds against the live server
    sleep(Duration::from_millis(400)).await;
    assert!(limiter.is_redis_alive());
}
