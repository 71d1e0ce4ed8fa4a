//! One-shot deadline that can be armed, cancelled and re-armed.
//!
//! The timer does not sleep on its own. Owners poll it with the current
//! instant, and the runtime sleeps until [`OneShot::deadline`]. Re-arming
//! replaces the old deadline; deadlines never stack.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OneShot {
    deadline: Option<Instant>,
}

impl OneShot {
    /// Arm (or re-arm) the timer to fire `after` from `now`.
    pub fn arm(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once, the first time `now` reaches the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "timer_test.rs"]
mod tests;
