//! Integration tests for the failure-count limiter
//!
//! These tests require Redis to be running locally on port 6379.
//! Run with: cargo test --test period_failure_integration -- --ignored

use std::sync::Arc;

use le_infra::cache::RedisClient;
use le_infra::config::{CacheConfig, PeriodFailureLimitSettings};
use le_infra::limit::{PeriodFailureLimit, PeriodFailureState};

/// Helper to create a test limiter with custom settings
async fn create_test_limiter(settings: PeriodFailureLimitSettings) -> PeriodFailureLimit {
    let client = RedisClient::new(CacheConfig::new("redis://localhost:6379"))
        .await
        .expect("Failed to create Redis client");
    PeriodFailureLimit::new(Arc::new(client), settings)
}

fn random_key(tag: &str) -> String {
    format!("test:failure:{}:{}", tag, rand::random::<u32>())
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_success_under_quota_clears_record() {
    let limiter = create_test_limiter(PeriodFailureLimitSettings {
        period_seconds: 3600,
        quota: 5,
        ..Default::default()
    })
    .await;
    let key = random_key("clear");

    assert_eq!(
        limiter.check(&key, false).await.unwrap(),
        PeriodFailureState::InQuota
    );
    assert_eq!(
        limiter.check(&key, false).await.unwrap(),
        PeriodFailureState::InQuota
    );
    assert_eq!(limiter.get_int(&key).await.unwrap(), Some(2));

    assert_eq!(
        limiter.check(&key, true).await.unwrap(),
        PeriodFailureState::Success
    );
    // the failure history is gone
    assert_eq!(limiter.get_int(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_success_does_not_unlock_exhausted_quota() {
    let limiter = create_test_limiter(PeriodFailureLimitSettings {
        period_seconds: 3600,
        quota: 3,
        ..Default::default()
    })
    .await;
    let key = random_key("lockout");

    // quota failures stay in quota
    for _ in 0..3 {
        assert_eq!(
            limiter.check(&key, false).await.unwrap(),
            PeriodFailureState::InQuota
        );
    }
    // one more locks the key out
    assert_eq!(
        limiter.check(&key, false).await.unwrap(),
        PeriodFailureState::OverQuota
    );

    // a success does NOT reset the counter once the quota is exhausted
    assert_eq!(
        limiter.check(&key, true).await.unwrap(),
        PeriodFailureState::OverQuota
    );
    assert_eq!(limiter.get_int(&key).await.unwrap(), Some(4));

    // explicit deletion is the only way out
    assert!(limiter.del(&key).await.unwrap());
    assert_eq!(
        limiter.check(&key, true).await.unwrap(),
        PeriodFailureState::Success
    );
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_check_result_maps_outcomes() {
    let limiter = create_test_limiter(PeriodFailureLimitSettings {
        period_seconds: 3600,
        quota: 5,
        ..Default::default()
    })
    .await;
    let key = random_key("result");

    let failed: Result<(), &str> = Err("wrong password");
    assert_eq!(
        limiter.check_result(&key, &failed).await.unwrap(),
        PeriodFailureState::InQuota
    );

    let succeeded: Result<(), &str> = Ok(());
    assert_eq!(
        limiter.check_result(&key, &succeeded).await.unwrap(),
        PeriodFailureState::Success
    );
    assert_eq!(limiter.get_int(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_set_quota_full_locks_out_key() {
    let limiter = create_test_limiter(PeriodFailureLimitSettings {
        period_seconds: 3600,
        quota: 3,
        ..Default::default()
    })
    .await;
    let key = random_key("force");

    limiter.set_quota_full(&key).await.unwrap();
    assert_eq!(limiter.get_int(&key).await.unwrap(), Some(3));

    // successes bounce off the forced lockout
    assert_eq!(
        limiter.check(&key, true).await.unwrap(),
        PeriodFailureState::OverQuota
    );

    limiter.del(&key).await.unwrap();
}
