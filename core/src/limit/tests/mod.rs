//! Unit tests for limiter domain types

mod token_bucket_tests;
