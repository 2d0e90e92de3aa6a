//! Unit tests for the token limiter internals

use crate::limit::token::bucket_keys;

#[test]
fn test_bucket_keys_share_a_hash_slot() {
    let (tokens, ts) = bucket_keys("api:search");
    assert_eq!(tokens, "{api:search}.tokens");
    assert_eq!(ts, "{api:search}.ts");
}

#[test]
fn test_bucket_keys_are_distinct() {
    let (tokens, ts) = bucket_keys("k");
    assert_ne!(tokens, ts);
}
