use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
/// Process-wide "away" switch. Off by default.
pub struct AutoReplyFlag {
    enabled: AtomicBool,
}

impl AutoReplyFlag {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Stores `enabled` and returns the previous value.
    pub fn set(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel)
    }
}
