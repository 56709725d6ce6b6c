use std::sync::atomic::{AtomicBool, Ordering};

/// Suppression switches shared by a service and every proxy it creates.
///
/// Changes are visible to the next `forward` call on any proxy; messages
/// already relayed are not revisited.
#[derive(Debug)]
pub struct RelayPolicy {
    echo_suppressed: AtomicBool,
    duplicate_suppressed: AtomicBool,
}

impl RelayPolicy {
    pub fn new(echo_suppressed: bool, duplicate_suppressed: bool) -> Self {
        Self {
            echo_suppressed: AtomicBool::new(echo_suppressed),
            duplicate_suppressed: AtomicBool::new(duplicate_suppressed),
        }
    }

    /// Never re-post a message into the channel it came from.
    pub fn echo_suppressed(&self) -> bool {
        self.echo_suppressed.load(Ordering::Relaxed)
    }

    /// Never re-post the same message id twice into one channel.
    pub fn duplicate_suppressed(&self) -> bool {
        self.duplicate_suppressed.load(Ordering::Relaxed)
    }

    pub fn set_echo_suppression(&self, suppressed: bool) {
        self.echo_suppressed.store(suppressed, Ordering::Relaxed);
    }

    pub fn set_duplicate_suppression(&self, suppressed: bool) {
        self.duplicate_suppressed
            .store(suppressed, Ordering::Relaxed);
    }
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self::new(true, true)
    }
}
