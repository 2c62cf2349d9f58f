//! Deliberate waits between remote calls.

use std::cell::RefCell;
use std::time::Duration;

/// Something that can suspend the cycle for a while.
pub trait Pacer {
    fn pause(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tracing::debug!(millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX), "pausing");
            std::thread::sleep(duration);
        }
    }
}

/// Records requested pauses without sleeping.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: RefCell<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.pauses.borrow().iter().sum()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}
