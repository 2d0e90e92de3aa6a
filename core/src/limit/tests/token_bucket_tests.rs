//! Unit tests for the in-process token bucket

use crate::limit::token_bucket::TokenBucket;

const T0: f64 = 1_700_000_000.0;

#[test]
fn test_full_burst_then_deny() {
    let bucket = TokenBucket::new(5, 10);

    for i in 0..10 {
        assert!(bucket.allow_at(T0, 1), "token {} of the burst should pass", i + 1);
    }
    assert!(!bucket.allow_at(T0, 1), "11th instantaneous request must be denied");
}

#[test]
fn test_refill_grants_exactly_one_token() {
    let bucket = TokenBucket::new(5, 10);

    for _ in 0..10 {
        assert!(bucket.allow_at(T0, 1));
    }
    assert!(!bucket.allow_at(T0, 1));

    // 1/rate seconds refills exactly one token
    assert!(bucket.allow_at(T0 + 0.2, 1));
    assert!(!bucket.allow_at(T0 + 0.2, 1));
}

#[test]
fn test_refill_caps_at_burst() {
    let bucket = TokenBucket::new(5, 10);

    for _ in 0..10 {
        assert!(bucket.allow_at(T0, 1));
    }

    // A long idle period refills to capacity, not beyond
    let later = T0 + 3600.0;
    for i in 0..10 {
        assert!(bucket.allow_at(later, 1), "token {} after idle should pass", i + 1);
    }
    assert!(!bucket.allow_at(later, 1));
}

#[test]
fn test_allow_n_consumes_multiple_tokens() {
    let bucket = TokenBucket::new(5, 10);

    assert!(bucket.allow_at(T0, 7));
    assert!(bucket.allow_at(T0, 3));
    assert!(!bucket.allow_at(T0, 1));
}

#[test]
fn test_request_larger_than_capacity_never_passes() {
    let bucket = TokenBucket::new(5, 10);
    assert!(!bucket.allow_at(T0, 11));
    // the failed oversized request must not consume anything
    assert!(bucket.allow_at(T0, 10));
}

#[test]
fn test_time_moving_backwards_does_not_refill() {
    let bucket = TokenBucket::new(5, 10);

    for _ in 0..10 {
        assert!(bucket.allow_at(T0, 1));
    }
    assert!(!bucket.allow_at(T0 - 100.0, 1));
}

#[test]
fn test_parameters_are_exposed() {
    let bucket = TokenBucket::new(5, 10);
    assert_eq!(bucket.rate(), 5.0);
    assert_eq!(bucket.burst(), 10.0);
}

#[test]
fn test_wall_clock_entry_points() {
    let bucket = TokenBucket::new(100, 10);
    assert!(bucket.allow());
    assert!(bucket.allow_n(2));
}
