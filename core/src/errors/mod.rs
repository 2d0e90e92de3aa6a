//! Domain-specific error types with bilingual support (English and Chinese)
//! for the verification-code protocol.

use thiserror::Error;

#[cfg(test)]
mod tests;

/// Verification protocol errors with bilingual messages
///
/// These are first-class outcomes of the send/verify scripts, not
/// exceptional conditions; callers are expected to branch on them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Maximum sends per day reached | 当日发送次数已达上限")]
    MaxSendPerDay,

    #[error("Resend requested too frequently | 重发过于频繁，请稍后再试")]
    ResendTooFrequently,

    #[error("Verification code required. Please request a code first | 请先获取验证码")]
    CodeRequired,

    #[error("Verification code expired | 验证码已过期")]
    CodeExpired,

    #[error("Maximum verification attempts exceeded. Please request a new code | 尝试次数超限，请重新获取验证码")]
    CodeMaxError,

    #[error("Invalid verification code | 验证码错误")]
    CodeMismatch,
}

/// Extract English message from a bilingual error string
pub fn extract_english_message(error_msg: &str) -> String {
    if let Some(pipe_index) = error_msg.find(" | ") {
        error_msg[..pipe_index].to_string()
    } else {
        error_msg.to_string()
    }
}

/// Extract Chinese message from a bilingual error string
pub fn extract_chinese_message(error_msg: &str) -> String {
    if let Some(pipe_index) = error_msg.find(" | ") {
        error_msg[pipe_index + 3..].to_string()
    } else {
        error_msg.to_string()
    }
}
