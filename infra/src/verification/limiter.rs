//! Verification code send/verify limiter
//!
//! Each target owns one hash record with fields `code`, `err`, `send` and
//! `lasted`. The record's TTL is set once, at creation, and bounds the
//! per-day send quota; resends never refresh it. Codes are stored as
//! SHA-256 digests, never in the clear, and targets are masked in logs.
//!
//! Both operations are single atomic scripts. Sending commits the
//! accounting state before the provider's delivery side effect runs; a
//! delivery failure after a successful commit is not rolled back
//! (at-most-once accounting, best-effort delivery).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use redis::Script;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use le_core::errors::VerifyError;
use le_shared::config::limit::VerificationSettings;

use crate::cache::RedisClient;
use crate::limit::{normalize_prefix, reply_as_int};
use crate::{LimitError, LimitResult};

/// Lua script: account for one code send.
///
/// Reply codes: 0 = proceed with delivery, 1 = daily send quota reached,
/// 2 = resend window still open. A resend stores the new code and bumps
/// `send`/`lasted` but leaves `err` and the record TTL untouched.
pub(crate) const SEND_CODE_SCRIPT: &str = r#"local sendCnt = redis.call('HGET', KEYS[1], 'send')
if sendCnt then
    local lasted = tonumber(redis.call('HGET', KEYS[1], 'lasted'))
    if tonumber(ARGV[4]) < lasted + tonumber(ARGV[2]) then
        return 2
    end
    if tonumber(sendCnt) >= tonumber(ARGV[1]) then
        return 1
    end
    redis.call('HSET', KEYS[1], 'code', ARGV[5], 'send', tonumber(sendCnt) + 1, 'lasted', ARGV[4])
    return 0
end
redis.call('HMSET', KEYS[1], 'code', ARGV[5], 'err', 0, 'send', 1, 'lasted', ARGV[4])
redis.call('EXPIRE', KEYS[1], ARGV[3])
return 0"#;

/// Lua script: check a supplied code against the record.
///
/// Reply codes: 0 = match, 1 = no record, 2 = code expired, 3 = attempt
/// quota exhausted, 4 = mismatch. Expiry is evaluated before the attempt
/// quota, so an expired code never burns an attempt. A match pushes
/// `lasted` back past the availability window, which makes the code
/// single-use while keeping the attempt history.
pub(crate) const VERIFY_CODE_SCRIPT: &str = r#"if redis.call('EXISTS', KEYS[1]) == 0 then
    return 1
end
local lasted = tonumber(redis.call('HGET', KEYS[1], 'lasted'))
local avail = tonumber(ARGV[2])
if tonumber(ARGV[3]) > lasted + avail then
    return 2
end
local errCnt = tonumber(redis.call('HGET', KEYS[1], 'err')) or 0
if errCnt >= tonumber(ARGV[1]) then
    return 3
end
if redis.call('HGET', KEYS[1], 'code') == ARGV[4] then
    redis.call('HSET', KEYS[1], 'lasted', lasted - avail)
    return 0
end
redis.call('HINCRBY', KEYS[1], 'err', 1)
return 4"#;

static SEND_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(SEND_CODE_SCRIPT));
static VERIFY_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(VERIFY_CODE_SCRIPT));

/// Trait for the code delivery side effect
#[async_trait]
pub trait CodeProviderTrait: Send + Sync {
    /// Deliver a verification code to the target (SMS, email, ...)
    async fn send_code(&self, target: &str, code: &str) -> Result<(), String>;
}

/// Send/verify limiter for verification codes
#[derive(Clone)]
pub struct VerificationLimit {
    client: Arc<RedisClient>,
    provider: Arc<dyn CodeProviderTrait>,
    settings: VerificationSettings,
    key_prefix: String,
}

impl VerificationLimit {
    /// Create a new verification limiter
    pub fn new(
        client: Arc<RedisClient>,
        provider: Arc<dyn CodeProviderTrait>,
        settings: VerificationSettings,
    ) -> Self {
        let key_prefix = normalize_prefix(&settings.key_prefix);
        Self {
            client,
            provider,
            settings,
            key_prefix,
        }
    }

    /// Send a verification code to `target`
    ///
    /// Rejects with [`VerifyError::ResendTooFrequently`] while the resend
    /// window is open and [`VerifyError::MaxSendPerDay`] once the record's
    /// send quota is exhausted. On acceptance the provider delivers the
    /// code; the accounting commit stands even if delivery fails.
    pub async fn send_code(&self, target: &str, code: &str) -> LimitResult<()> {
        let mut conn = self.client.get_connection();
        let reply: redis::Value = SEND_SCRIPT
            .key(self.record_key(target))
            .arg(self.settings.max_send_per_day)
            .arg(self.settings.resend_interval_seconds)
            .arg(self.settings.expire_seconds)
            .arg(Utc::now().timestamp())
            .arg(hash_code(code))
            .invoke_async(&mut conn)
            .await?;

        let reply_code = reply_as_int(&reply).ok_or(LimitError::UnexpectedReply)?;
        if let Err(e) = send_outcome(reply_code) {
            warn!("code send rejected for {}: {}", mask_target(target), e);
            return Err(e);
        }

        debug!("code send accounted for {}", mask_target(target));
        self.provider
            .send_code(target, code)
            .await
            .map_err(LimitError::Provider)?;

        info!("verification code sent to {}", mask_target(target));
        Ok(())
    }

    /// Verify a code supplied for `target`
    ///
    /// Success consumes the code: an immediate replay of the same code
    /// fails with [`VerifyError::CodeExpired`]. Wrong codes burn attempts
    /// until [`VerifyError::CodeMaxError`]; an expired code does not.
    pub async fn verify_code(&self, target: &str, code: &str) -> LimitResult<()> {
        let mut conn = self.client.get_connection();
        let reply: redis::Value = VERIFY_SCRIPT
            .key(self.record_key(target))
            .arg(self.settings.max_error_count)
            .arg(self.settings.code_available_seconds)
            .arg(Utc::now().timestamp())
            .arg(hash_code(code))
            .invoke_async(&mut conn)
            .await?;

        let reply_code = reply_as_int(&reply).ok_or(LimitError::UnexpectedReply)?;
        match verify_outcome(reply_code) {
            Ok(()) => {
                info!("verification code accepted for {}", mask_target(target));
                Ok(())
            }
            Err(e) => {
                warn!("verification failed for {}: {}", mask_target(target), e);
                Err(e)
            }
        }
    }

    /// Delete the verification record for `target`
    pub async fn del(&self, target: &str) -> LimitResult<bool> {
        self.client.delete(&self.record_key(target)).await
    }

    /// Remaining record TTL in seconds, with the store's sentinel replies
    /// passed through (-2 missing key, -1 no expiry)
    pub async fn ttl(&self, target: &str) -> LimitResult<i64> {
        self.client.ttl(&self.record_key(target)).await
    }

    fn record_key(&self, target: &str) -> String {
        format!("{}{}", self.key_prefix, target)
    }
}

/// Map a send-script reply code to its outcome
pub(crate) fn send_outcome(code: i64) -> LimitResult<()> {
    match code {
        0 => Ok(()),
        1 => Err(VerifyError::MaxSendPerDay.into()),
        2 => Err(VerifyError::ResendTooFrequently.into()),
        other => Err(LimitError::UnknownCode(other)),
    }
}

/// Map a verify-script reply code to its outcome
pub(crate) fn verify_outcome(code: i64) -> LimitResult<()> {
    match code {
        0 => Ok(()),
        1 => Err(VerifyError::CodeRequired.into()),
        2 => Err(VerifyError::CodeExpired.into()),
        3 => Err(VerifyError::CodeMaxError.into()),
        4 => Err(VerifyError::CodeMismatch.into()),
        other => Err(LimitError::UnknownCode(other)),
    }
}

/// Hash a verification code for storage
pub(crate) fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Mask a target for logging (show only the last 4 characters)
pub(crate) fn mask_target(target: &str) -> String {
    if target.len() <= 4 {
        "****".to_string()
    } else {
        format!("***{}", &target[target.len() - 4..])
    }
}
