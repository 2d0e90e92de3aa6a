//! Mock code provider for testing
//!
//! Records every delivery instead of sending anything, with optional
//! failure injection for exercising the commit-before-delivery path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::verification::limiter::CodeProviderTrait;

/// In-memory code provider that records sent codes
#[derive(Default)]
pub struct MockCodeProvider {
    sent: Mutex<Vec<(String, String)>>,
    fail_next: AtomicBool,
}

impl MockCodeProvider {
    /// Create a provider that accepts every delivery
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail
    pub fn set_fail(&self, fail: bool) {
        self.fail_next.store(fail, Ordering::Release);
    }

    /// All (target, code) pairs delivered so far
    pub fn sent_codes(&self) -> Vec<(String, String)> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The most recent code delivered to `target`
    pub fn last_code_for(&self, target: &str) -> Option<String> {
        self.sent_codes()
            .iter()
            .rev()
            .find(|(t, _)| t == target)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl CodeProviderTrait for MockCodeProvider {
    async fn send_code(&self, target: &str, code: &str) -> Result<(), String> {
        if self.fail_next.load(Ordering::Acquire) {
            return Err("mock delivery failure".to_string());
        }
        let mut guard = match self.sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((target.to_string(), code.to_string()));
        Ok(())
    }
}
