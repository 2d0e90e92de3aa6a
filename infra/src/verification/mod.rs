//! Verification-code throttling
//!
//! Send-quota, resend-cooldown and attempt-quota enforcement for
//! verification codes, layered over a single hash record per target.

pub mod limiter;
pub mod mock;

#[cfg(test)]
mod tests;

pub use limiter::{CodeProviderTrait, VerificationLimit};
pub use mock::MockCodeProvider;
