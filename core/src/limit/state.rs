//! Result states for the period limiters
//!
//! The Lua scripts reply with small integer codes whose numbering differs
//! from the public enum ordering; `from_script_code` is the single place the
//! two meet. Both numberings are stable and must not be normalized to match.

use std::fmt;

/// Outcome of a fixed-window period limiter check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodLimitState {
    /// The script replied with something outside its contract
    Unknown = 0,
    /// Request accepted, quota not yet reached
    Allowed = 1,
    /// Request accepted and the quota is now exactly consumed
    HitQuota = 2,
    /// Request rejected, quota exhausted
    OverQuota = 3,
}

impl PeriodLimitState {
    /// Map a script reply code to a state.
    ///
    /// Script codes: 0 = over quota, 1 = allowed, 2 = hit quota.
    pub fn from_script_code(code: i64) -> Self {
        match code {
            0 => Self::OverQuota,
            1 => Self::Allowed,
            2 => Self::HitQuota,
            _ => Self::Unknown,
        }
    }

    /// The request was accepted (quota not exceeded)
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed | Self::HitQuota)
    }

    /// This request consumed the final unit of quota
    pub fn is_hit_quota(&self) -> bool {
        matches!(self, Self::HitQuota)
    }

    /// The request was rejected
    pub fn is_over_quota(&self) -> bool {
        matches!(self, Self::OverQuota)
    }
}

impl fmt::Display for PeriodLimitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Allowed => "allowed",
            Self::HitQuota => "hit quota",
            Self::OverQuota => "over quota",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a failure-count limiter check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFailureState {
    /// The script replied with something outside its contract
    Unknown = 0,
    /// The attempt succeeded and any failure history was cleared
    Success = 1,
    /// The attempt failed but the failure quota is not exhausted
    InQuota = 2,
    /// The failure quota is exhausted; only an explicit delete unlocks
    OverQuota = 3,
}

impl PeriodFailureState {
    /// Map a script reply code to a state.
    ///
    /// Script codes: 0 = success, 1 = in quota, 2 = over quota.
    pub fn from_script_code(code: i64) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::InQuota,
            2 => Self::OverQuota,
            _ => Self::Unknown,
        }
    }

    /// The attempt succeeded and cleared the failure record
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The caller may keep trying (success, or failures under quota)
    pub fn is_within_quota(&self) -> bool {
        matches!(self, Self::Success | Self::InQuota)
    }

    /// The key is locked out until explicitly deleted or expired
    pub fn is_over_quota(&self) -> bool {
        matches!(self, Self::OverQuota)
    }
}

impl fmt::Display for PeriodFailureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Success => "success",
            Self::InQuota => "in quota",
            Self::OverQuota => "over quota",
        };
        write!(f, "{}", name)
    }
}
