//! Room events and their wire mapping.
//!
//! DESIGN
//! ======
//! The session only ever sees typed [`OutboundEvent`] / [`InboundEvent`]
//! values. Frames are the transport's concern: outbound events become
//! `Request` frames named after the event, and inbound frames are parsed back
//! by event name. Payload field names follow the relay's camelCase contract.

use std::time::{SystemTime, UNIX_EPOCH};

use frames::{Frame, Status};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::language::Language;

// =============================================================================
// EVENT NAMES
// =============================================================================

pub const JOIN: &str = "join";
pub const LEAVE_ROOM: &str = "leaveRoom";
pub const CODE_CHANGE: &str = "codeChange";
pub const TYPING: &str = "typing";
pub const LANGUAGE_CHANGE: &str = "languageChange";
pub const COMPILE_CODE: &str = "compileCode";

pub const USER_JOINED: &str = "userJoined";
pub const CODE_UPDATE: &str = "codeUpdate";
pub const USER_TYPING: &str = "userTyping";
pub const LANGUAGE_UPDATE: &str = "languageUpdate";
pub const CODE_RESPONSE: &str = "codeResponse";

// =============================================================================
// OUTBOUND
// =============================================================================

/// Event sent from this client to the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundEvent {
    Join { room_id: String, username: String },
    /// The relay knows which room the connection joined.
    LeaveRoom,
    CodeChange { room_id: String, code: String },
    Typing { room_id: String, username: String },
    LanguageChange { room_id: String, language: Language },
    CompileCode {
        /// Becomes the frame id, so replies can point back at it.
        request_id: Uuid,
        code: String,
        room_id: String,
        language: Language,
        version: String,
    },
}

impl OutboundEvent {
    /// Event name on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => JOIN,
            Self::LeaveRoom => LEAVE_ROOM,
            Self::CodeChange { .. } => CODE_CHANGE,
            Self::Typing { .. } => TYPING,
            Self::LanguageChange { .. } => LANGUAGE_CHANGE,
            Self::CompileCode { .. } => COMPILE_CODE,
        }
    }

    /// Room this event is scoped to, when the payload names one.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::Join { room_id, .. }
            | Self::CodeChange { room_id, .. }
            | Self::Typing { room_id, .. }
            | Self::LanguageChange { room_id, .. }
            | Self::CompileCode { room_id, .. } => Some(room_id),
            Self::LeaveRoom => None,
        }
    }

    /// JSON payload carried in the frame's `data`.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::Join { room_id, username } | Self::Typing { room_id, username } => {
                serde_json::json!({ "roomId": room_id, "username": username })
            }
            Self::LeaveRoom => serde_json::json!({}),
            Self::CodeChange { room_id, code } => serde_json::json!({ "roomId": room_id, "code": code }),
            Self::LanguageChange { room_id, language } => {
                serde_json::json!({ "roomId": room_id, "language": language.as_str() })
            }
            Self::CompileCode { code, room_id, language, version, .. } => serde_json::json!({
                "code": code,
                "roomId": room_id,
                "language": language.as_str(),
                "version": version,
            }),
        }
    }

    /// Wrap the event in a request frame.
    #[must_use]
    pub fn to_frame(&self, from: Option<&str>) -> Frame {
        let id = match self {
            Self::CompileCode { request_id, .. } => *request_id,
            _ => Uuid::new_v4(),
        };
        Frame {
            id: id.to_string(),
            parent_id: None,
            ts: now_ms(),
            room_id: self.room_id().map(str::to_owned),
            from: from.map(str::to_owned),
            event: self.name().to_owned(),
            status: Status::Request,
            data: self.payload(),
        }
    }
}

// =============================================================================
// INBOUND
// =============================================================================

/// Event delivered by the relay to this client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    /// Full membership list, server order.
    UserJoined(Vec<String>),
    CodeUpdate(String),
    UserTyping(String),
    /// Raw language name; validated when applied.
    LanguageUpdate(String),
    CodeResponse {
        output: String,
        /// Id of the `compileCode` frame this answers, if the relay echoes it.
        parent_id: Option<String>,
    },
}

/// Why an inbound frame could not become an [`InboundEvent`].
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("unknown event `{0}`")]
    Unknown(String),
    #[error("malformed `{event}` payload: {source}")]
    Malformed {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("relay reported error for `{event}`: {message}")]
    Relay { event: String, message: String },
}

#[derive(Deserialize)]
struct CodeResponsePayload {
    run: RunOutput,
}

#[derive(Deserialize)]
struct RunOutput {
    output: String,
}

impl InboundEvent {
    /// Event name on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserJoined(_) => USER_JOINED,
            Self::CodeUpdate(_) => CODE_UPDATE,
            Self::UserTyping(_) => USER_TYPING,
            Self::LanguageUpdate(_) => LANGUAGE_UPDATE,
            Self::CodeResponse { .. } => CODE_RESPONSE,
        }
    }

    /// Interpret a frame received from the relay.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Relay`] for error-status frames,
    /// [`EventError::Unknown`] for event names this client does not handle and
    /// [`EventError::Malformed`] when the payload does not match the event.
    pub fn from_frame(frame: &Frame) -> Result<Self, EventError> {
        if frame.status == Status::Error {
            return Err(EventError::Relay {
                event: frame.event.clone(),
                message: frame.error_message().unwrap_or("unknown relay error").to_owned(),
            });
        }

        let malformed = |source: serde_json::Error| EventError::Malformed { event: frame.event.clone(), source };
        let data = frame.data.clone();
        match frame.event.as_str() {
            USER_JOINED => serde_json::from_value(data).map(Self::UserJoined).map_err(malformed),
            CODE_UPDATE => serde_json::from_value(data).map(Self::CodeUpdate).map_err(malformed),
            USER_TYPING => serde_json::from_value(data).map(Self::UserTyping).map_err(malformed),
            LANGUAGE_UPDATE => serde_json::from_value(data).map(Self::LanguageUpdate).map_err(malformed),
            CODE_RESPONSE => {
                let payload: CodeResponsePayload = serde_json::from_value(data).map_err(malformed)?;
                Ok(Self::CodeResponse { output: payload.run.output, parent_id: frame.parent_id.clone() })
            }
            other => Err(EventError::Unknown(other.to_owned())),
        }
    }
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
