// Collaborators standing in for the network and the sensors in tests and demos.

mod gaussian;
pub mod publisher;
pub mod source;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::errors::TelemetryError;
use crate::ports::Clock;

pub use publisher::TelemetryPublisherMock;
pub use source::MockReadingSource;

/// Manually driven clock.
#[derive(Debug, Default)]
pub struct MockClock {
    now: AtomicU64,
}

impl MockClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_epoch_secs(&self) -> Result<u64, TelemetryError> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock() {
        let clock = MockClock::new(10);
        assert_eq!(clock.now_epoch_secs(), Ok(10));
        clock.advance(5);
        assert_eq!(clock.now_epoch_secs(), Ok(15));
        clock.set(1);
        assert_eq!(clock.now_epoch_secs(), Ok(1));
    }
}
