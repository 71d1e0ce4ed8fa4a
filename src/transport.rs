//! Relay WebSocket transport.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs on its own task. Drains the outbox receiver into the socket and
//! turns socket messages into [`InboundEvent`]s for the runtime. The session
//! never sees connection state: while disconnected, outbound events wait in
//! the channel and go out after the next successful connect.
//!
//! RECONNECT
//! =========
//! Any socket error or close ends the connection; the loop sleeps and dials
//! again, doubling the delay up to `reconnect_max`. A successful connect
//! resets the delay. The loop ends for good once the outbox is dropped and
//! drained, or once nobody reads inbound events.
//!
//! The relay scopes room membership to a socket, so the last `join` sent is
//! remembered and replayed first on every new connection until a
//! `leaveRoom` goes out.

use std::time::Duration;

use frames::{Encoding, Frame, Payload};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::TransportConfig;
use crate::events::{EventError, InboundEvent, OutboundEvent};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame codec failed: {0}")]
    Codec(#[from] frames::CodecError),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WsConnect(Box::new(error))
    }
}

/// Why one connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Socket dropped; dial again.
    Disconnected,
    /// Outbox dropped and drained, or inbound receiver gone.
    Finished,
}

/// Spawn the transport task.
///
/// `from` is stamped on every outbound frame as the sender label.
pub fn spawn_transport(
    config: TransportConfig,
    outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    from: Option<String>,
) -> (mpsc::UnboundedReceiver<InboundEvent>, JoinHandle<()>) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(transport_loop(config, outbound, inbound_tx, from));
    (inbound_rx, handle)
}

async fn transport_loop(
    config: TransportConfig,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    inbound: mpsc::UnboundedSender<InboundEvent>,
    from: Option<String>,
) {
    let mut backoff = config.reconnect_min;
    let mut membership = None;

    loop {
        match connect_and_run(&config, &mut outbound, &inbound, from.as_deref(), &mut membership).await {
            Ok(Exit::Finished) => {
                info!(url = %config.relay_url, "transport finished");
                return;
            }
            Ok(Exit::Disconnected) => {
                info!(url = %config.relay_url, "relay disconnected");
                backoff = config.reconnect_min;
            }
            Err(e) => {
                warn!(url = %config.relay_url, error = %e, ?backoff, "relay connection failed");
            }
        }

        if inbound.is_closed() || (outbound.is_closed() && outbound.is_empty()) {
            return;
        }
        tokio::time::sleep(backoff).await;
        backoff = next_backoff(backoff, config.reconnect_max);
    }
}

async fn connect_and_run(
    config: &TransportConfig,
    outbound: &mut mpsc::UnboundedReceiver<OutboundEvent>,
    inbound: &mpsc::UnboundedSender<InboundEvent>,
    from: Option<&str>,
    membership: &mut Option<OutboundEvent>,
) -> Result<Exit, TransportError> {
    let (stream, _) = connect_async(config.relay_url.as_str()).await?;
    info!(url = %config.relay_url, encoding = ?config.encoding, "connected to relay");
    let (mut ws_write, mut ws_read) = stream.split();

    if let Some(join) = membership.as_ref() {
        info!(room_id = ?join.room_id(), "rejoining room after reconnect");
        ws_write.send(encode_message(join, config.encoding, from)?).await?;
    }

    loop {
        tokio::select! {
            event = outbound.recv() => {
                let Some(event) = event else {
                    // Best effort; the relay may already be gone.
                    let _ = ws_write.send(Message::Close(None)).await;
                    return Ok(Exit::Finished);
                };
                track_membership(membership, &event);
                let message = encode_message(&event, config.encoding, from)?;
                debug!(event = event.name(), "sending frame");
                ws_write.send(message).await?;
            }
            message = ws_read.next() => {
                let Some(message) = message else {
                    return Ok(Exit::Disconnected);
                };
                match message? {
                    Message::Close(_) => return Ok(Exit::Disconnected),
                    Message::Ping(data) => ws_write.send(Message::Pong(data)).await?,
                    other => {
                        let Some(event) = decode_message(&other) else {
                            continue;
                        };
                        if inbound.send(event).is_err() {
                            return Ok(Exit::Finished);
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// MESSAGE MAPPING
// =============================================================================

/// Encode an outbound event as a WebSocket message.
///
/// # Errors
///
/// Returns [`frames::CodecError`] if the payload cannot be serialized.
pub fn encode_message(
    event: &OutboundEvent,
    encoding: Encoding,
    from: Option<&str>,
) -> Result<Message, frames::CodecError> {
    let frame = event.to_frame(from);
    Ok(match frames::encode(&frame, encoding)? {
        Payload::Text(text) => Message::Text(text.into()),
        Payload::Binary(bytes) => Message::Binary(bytes.into()),
    })
}

/// Decode a WebSocket message into an inbound event.
///
/// Both encodings are accepted regardless of the configured one. Control
/// messages, undecodable frames, unknown events and relay errors yield
/// `None`; the last three are logged.
#[must_use]
pub fn decode_message(message: &Message) -> Option<InboundEvent> {
    let decoded = match message {
        Message::Text(text) => frames::decode_json(text.as_str()),
        Message::Binary(bytes) => frames::decode_binary(bytes),
        _ => return None,
    };

    let frame = match decoded {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "dropping undecodable frame");
            return None;
        }
    };
    interpret(&frame)
}

fn interpret(frame: &Frame) -> Option<InboundEvent> {
    match InboundEvent::from_frame(frame) {
        Ok(event) => {
            debug!(event = event.name(), frame_id = %frame.id, "received frame");
            Some(event)
        }
        Err(EventError::Relay { event, message }) => {
            warn!(%event, %message, "relay reported error");
            None
        }
        Err(e) => {
            warn!(error = %e, frame_id = %frame.id, "dropping inbound frame");
            None
        }
    }
}

/// Remember the last `join` until a `leaveRoom` follows it.
///
/// Updated before the send, so a join lost with a dying socket is still
/// replayed on the next connection.
fn track_membership(membership: &mut Option<OutboundEvent>, event: &OutboundEvent) {
    match event {
        OutboundEvent::Join { .. } => *membership = Some(event.clone()),
        OutboundEvent::LeaveRoom => *membership = None,
        _ => {}
    }
}

/// Next reconnect delay: double, capped at `max`.
#[must_use]
pub fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
