//! Limiter configuration module

use serde::{Deserialize, Serialize};

/// Settings for the fixed-window period limiter
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeriodLimitSettings {
    /// Window length in seconds
    pub period_seconds: i64,

    /// Maximum permitted requests per window
    pub quota: i64,

    /// Key prefix for counter records (a trailing `:` is enforced)
    #[serde(default = "default_period_prefix")]
    pub key_prefix: String,

    /// Align the window end to the next local-time period boundary
    /// instead of `period_seconds` from the first request
    #[serde(default)]
    pub align: bool,
}

impl Default for PeriodLimitSettings {
    fn default() -> Self {
        Self {
            period_seconds: 3600,
            quota: 100,
            key_prefix: default_period_prefix(),
            align: false,
        }
    }
}

/// Settings for the failure-count limiter
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeriodFailureLimitSettings {
    /// Window length in seconds
    pub period_seconds: i64,

    /// Maximum permitted failures per window
    pub quota: i64,

    /// Key prefix for failure records (a trailing `:` is enforced)
    #[serde(default = "default_failure_prefix")]
    pub key_prefix: String,
}

impl Default for PeriodFailureLimitSettings {
    fn default() -> Self {
        Self {
            period_seconds: 3600,
            quota: 5,
            key_prefix: default_failure_prefix(),
        }
    }
}

/// Settings for the token-bucket limiter
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenLimitSettings {
    /// Refill rate in tokens per second
    pub rate: u32,

    /// Bucket capacity (maximum burst)
    pub burst: u32,

    /// Base key for the bucket state pair
    #[serde(default = "default_token_key")]
    pub key: String,
}

impl Default for TokenLimitSettings {
    fn default() -> Self {
        Self {
            rate: 5,
            burst: 10,
            key: default_token_key(),
        }
    }
}

/// Settings for the verification-code send/verify protocol
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationSettings {
    /// Key prefix for verification records (a trailing `:` is enforced)
    #[serde(default = "default_verification_prefix")]
    pub key_prefix: String,

    /// Maximum code sends per record lifetime (the "per day" quota)
    pub max_send_per_day: i64,

    /// Minimum seconds between two sends to the same target
    pub resend_interval_seconds: i64,

    /// Seconds a sent code stays valid for verification
    pub code_available_seconds: i64,

    /// Maximum wrong-code attempts before the record locks
    pub max_error_count: i64,

    /// Record lifetime in seconds (bounds the send quota window)
    pub expire_seconds: i64,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            key_prefix: default_verification_prefix(),
            max_send_per_day: 10,
            resend_interval_seconds: 60,
            code_available_seconds: 300,
            max_error_count: 3,
            expire_seconds: 86400,
        }
    }
}

/// Limiter configuration for all limiter types
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LimitConfig {
    /// Fixed-window period limiter settings
    #[serde(default)]
    pub period: PeriodLimitSettings,

    /// Failure-count limiter settings
    #[serde(default)]
    pub failure: PeriodFailureLimitSettings,

    /// Token-bucket limiter settings
    #[serde(default)]
    pub token: TokenLimitSettings,

    /// Verification protocol settings
    #[serde(default)]
    pub verification: VerificationSettings,
}

impl LimitConfig {
    /// Create a development configuration (more lenient limits)
    pub fn development() -> Self {
        Self {
            period: PeriodLimitSettings {
                quota: 1000,
                ..Default::default()
            },
            failure: PeriodFailureLimitSettings {
                quota: 50,
                ..Default::default()
            },
            token: TokenLimitSettings {
                rate: 100,
                burst: 200,
                ..Default::default()
            },
            verification: VerificationSettings {
                max_send_per_day: 100,
                resend_interval_seconds: 1,
                ..Default::default()
            },
        }
    }

    /// Create a production configuration (stricter limits)
    pub fn production() -> Self {
        Self::default()
    }
}

fn default_period_prefix() -> String {
    "limit:period:".to_string()
}

fn default_failure_prefix() -> String {
    "limit:failure:".to_string()
}

fn default_token_key() -> String {
    "limit:token".to_string()
}

fn default_verification_prefix() -> String {
    "limit:verification:".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_config_default() {
        let config = LimitConfig::default();
        assert_eq!(config.period.period_seconds, 3600);
        assert_eq!(config.failure.quota, 5);
        assert_eq!(config.token.rate, 5);
        assert_eq!(config.token.burst, 10);
        assert_eq!(config.verification.max_error_count, 3);
        assert!(!config.period.align);
    }

    #[test]
    fn test_development_is_more_lenient() {
        let dev = LimitConfig::development();
        let prod = LimitConfig::production();
        assert!(dev.period.quota > prod.period.quota);
        assert!(dev.failure.quota > prod.failure.quota);
        assert!(dev.verification.max_send_per_day > prod.verification.max_send_per_day);
    }

    #[test]
    fn test_deserialize_with_partial_fields() {
        let json = r#"{
            "period": { "period_seconds": 86400, "quota": 5, "align": true },
            "verification": {
                "max_send_per_day": 3,
                "resend_interval_seconds": 90,
                "code_available_seconds": 180,
                "max_error_count": 5,
                "expire_seconds": 86400
            }
        }"#;

        let config: LimitConfig = serde_json::from_str(json).expect("valid config");
        assert_eq!(config.period.period_seconds, 86400);
        assert!(config.period.align);
        assert_eq!(config.period.key_prefix, "limit:period:");
        assert_eq!(config.verification.resend_interval_seconds, 90);
        // untouched groups fall back to defaults
        assert_eq!(config.token.burst, 10);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = LimitConfig::development();
        let json = serde_json::to_string(&config).expect("serialize");
        let back: LimitConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.token.rate, config.token.rate);
        assert_eq!(back.verification.max_send_per_day, config.verification.max_send_per_day);
    }
}
