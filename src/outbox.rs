//! Outbound event handle.
//!
//! The session owns the only [`Outbox`]; components borrow it to emit.
//! Delivery is the transport's problem: a closed channel is logged and
//! otherwise ignored, so the state machine never learns about disconnects.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::OutboundEvent;

/// Sending half of the outbound event queue.
#[derive(Debug)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

/// Create an outbox and the receiver the transport drains.
#[must_use]
pub fn channel() -> (Outbox, mpsc::UnboundedReceiver<OutboundEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbox { tx }, rx)
}

impl Outbox {
    /// Queue an event for the relay.
    ///
    /// Returns `false` if the transport side is gone.
    pub fn emit(&self, event: OutboundEvent) -> bool {
        let name = event.name();
        match self.tx.send(event) {
            Ok(()) => {
                debug!(event = name, "outbound event queued");
                true
            }
            Err(_) => {
                warn!(event = name, "outbound channel closed; event dropped");
                false
            }
        }
    }

    /// True once the receiving side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
#[path = "outbox_test.rs"]
mod tests;
