//! Typing activity: outbound signals and the single inbound notice.
//!
//! Every local edit emits one `typing` event. Inbound signals share a single
//! notice line; the newest signal replaces the text and restarts expiry, so
//! the notice stays up during a steady stream and drops `timeout` after the
//! last signal.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::events::OutboundEvent;
use crate::outbox::Outbox;
use crate::timer::OneShot;

pub const DEFAULT_TYPING_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(DEFAULT_TYPING_TIMEOUT_MS);

/// Characters of the username kept in the notice.
const NOTICE_NAME_CHARS: usize = 8;

/// Notice text shown for a remote typist.
#[must_use]
pub fn notice_text(username: &str) -> String {
    let short: String = username.chars().take(NOTICE_NAME_CHARS).collect();
    format!("{short}... is Typing")
}

#[derive(Clone, Debug)]
pub struct TypingIndicator {
    text: Option<String>,
    expiry: OneShot,
    timeout: Duration,
}

impl Default for TypingIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_TIMEOUT)
    }
}

impl TypingIndicator {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { text: None, expiry: OneShot::default(), timeout }
    }

    /// Emit a `typing` signal for a local edit. No throttling.
    pub fn on_local_edit(&self, outbox: &Outbox, room_id: &str, username: &str) {
        outbox.emit(OutboundEvent::Typing { room_id: room_id.to_owned(), username: username.to_owned() });
    }

    /// Show the notice for `username` and restart expiry from `now`.
    pub fn on_remote_typing(&mut self, username: &str, now: Instant) {
        self.text = Some(notice_text(username));
        self.expiry.arm(now, self.timeout);
    }

    /// Clear the notice if its deadline has passed. Returns `true` when it was cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.expiry.poll(now) {
            debug!("typing notice expired");
            self.text = None;
            return true;
        }
        false
    }

    /// Current notice, or `""` when nobody is typing.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.expiry.deadline()
    }

    pub fn reset(&mut self) {
        self.text = None;
        self.expiry.cancel();
    }
}

#[cfg(test)]
#[path = "typing_test.rs"]
mod tests;
