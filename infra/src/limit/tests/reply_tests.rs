//! Unit tests for script reply decoding and key helpers

use redis::Value;

use crate::limit::{normalize_prefix, reply_as_bool, reply_as_int};

#[test]
fn test_reply_as_int_accepts_integers() {
    assert_eq!(reply_as_int(&Value::Int(0)), Some(0));
    assert_eq!(reply_as_int(&Value::Int(2)), Some(2));
    assert_eq!(reply_as_int(&Value::Int(-3)), Some(-3));
}

#[test]
fn test_reply_as_int_rejects_other_shapes() {
    assert_eq!(reply_as_int(&Value::Nil), None);
    assert_eq!(reply_as_int(&Value::Data(b"1".to_vec())), None);
    assert_eq!(reply_as_int(&Value::Status("OK".to_string())), None);
    assert_eq!(reply_as_int(&Value::Bulk(vec![Value::Int(1)])), None);
}

#[test]
fn test_reply_as_bool_maps_lua_booleans() {
    // Lua false comes back as nil, Lua true as integer 1
    assert_eq!(reply_as_bool(&Value::Nil), Some(false));
    assert_eq!(reply_as_bool(&Value::Int(1)), Some(true));
    assert_eq!(reply_as_bool(&Value::Int(0)), Some(false));
}

#[test]
fn test_reply_as_bool_rejects_other_shapes() {
    assert_eq!(reply_as_bool(&Value::Status("OK".to_string())), None);
    assert_eq!(reply_as_bool(&Value::Data(b"true".to_vec())), None);
}

#[test]
fn test_normalize_prefix_appends_separator() {
    assert_eq!(normalize_prefix("sms"), "sms:");
    assert_eq!(normalize_prefix("limit:period"), "limit:period:");
}

#[test]
fn test_normalize_prefix_keeps_existing_separator() {
    assert_eq!(normalize_prefix("sms:"), "sms:");
}
