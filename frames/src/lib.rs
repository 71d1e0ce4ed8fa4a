//! Room frame model and codecs for the relay WebSocket.
//!
//! Every room event (outbound or inbound) travels as one [`Frame`]: the event
//! name plus a JSON payload, wrapped with routing metadata. Two encodings are
//! supported because relays differ in what they speak:
//!
//! - [`Encoding::Binary`]: protobuf, carried in binary WS messages.
//! - [`Encoding::Json`]: plain JSON object, carried in text WS messages.
//!
//! Payloads stay flexible (`serde_json::Value`); typed interpretation lives in
//! the session crate.

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by the decoders.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The text could not be parsed as a JSON frame.
    #[error("failed to decode json frame: {0}")]
    Json(#[from] serde_json::Error),
    /// The `status` integer on the wire does not map to a known [`Status`] variant.
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
}

/// Which representation frames use on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    /// JSON text messages.
    #[default]
    Json,
    /// Protobuf binary messages.
    Binary,
}

/// Position of a frame in an exchange.
///
/// Room broadcasts are plain `Request` frames. Relays that answer requests
/// use `Done`, and report failures with `Error`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Event originated by a peer or by this client.
    #[default]
    Request,
    /// Successful reply to an earlier frame.
    Done,
    /// Failure reply; `data.message` carries the reason.
    Error,
}

impl Status {
    /// Convert status into wire enum integer value.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Request => WireStatus::Request as i32,
            Self::Done => WireStatus::Done as i32,
            Self::Error => WireStatus::Error as i32,
        }
    }

    fn from_i32(value: i32) -> Result<Self, CodecError> {
        match WireStatus::try_from(value) {
            Ok(WireStatus::Request) => Ok(Self::Request),
            Ok(WireStatus::Done) => Ok(Self::Done),
            Ok(WireStatus::Error) => Ok(Self::Error),
            Err(_) => Err(CodecError::InvalidStatus(value)),
        }
    }
}

/// A single room event on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Unique identifier for this frame (UUID string).
    pub id: String,
    /// ID of the frame this one answers, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Milliseconds since the Unix epoch when the frame was created.
    #[serde(default)]
    pub ts: i64,
    /// Room the event is scoped to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    /// Sender label (username or relay label).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Event name, e.g. `"codeChange"`.
    pub event: String,
    #[serde(default)]
    pub status: Status,
    /// Event payload.
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    /// Error message carried by an error frame, if present.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }
}

/// Encoded frame ready to hand to a WebSocket sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Text message body.
    Text(String),
    /// Binary message body.
    Binary(Vec<u8>),
}

/// Encode a frame using the requested encoding.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the payload cannot be rendered as JSON.
pub fn encode(frame: &Frame, encoding: Encoding) -> Result<Payload, CodecError> {
    match encoding {
        Encoding::Json => Ok(Payload::Text(encode_json(frame)?)),
        Encoding::Binary => Ok(Payload::Binary(encode_binary(frame))),
    }
}

/// Encode a frame as protobuf bytes.
#[must_use]
pub fn encode_binary(frame: &Frame) -> Vec<u8> {
    let wire = frame_to_wire(frame);

    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec cannot run out of space.
    wire.encode(&mut out).unwrap_or_default();
    out
}

/// Encode a frame as a JSON string.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_json(frame: &Frame) -> Result<String, CodecError> {
    Ok(serde_json::to_string(frame)?)
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::InvalidStatus`] for out-of-range status values.
pub fn decode_binary(bytes: &[u8]) -> Result<Frame, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    wire_to_frame(wire)
}

/// Decode a JSON text message into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] when the text is not a frame object.
pub fn decode_json(text: &str) -> Result<Frame, CodecError> {
    Ok(serde_json::from_str(text)?)
}

fn frame_to_wire(frame: &Frame) -> WireFrame {
    WireFrame {
        id: frame.id.clone(),
        parent_id: frame.parent_id.clone(),
        ts: frame.ts,
        room_id: frame.room_id.clone(),
        from: frame.from.clone(),
        event: frame.event.clone(),
        status: frame.status.as_i32(),
        data: Some(to_proto(&frame.data)),
    }
}

fn wire_to_frame(wire: WireFrame) -> Result<Frame, CodecError> {
    Ok(Frame {
        id: wire.id,
        parent_id: wire.parent_id,
        ts: wire.ts,
        room_id: wire.room_id,
        from: wire.from,
        event: wire.event,
        status: Status::from_i32(wire.status)?,
        data: wire.data.map_or(Value::Object(Map::new()), |v| from_proto(&v)),
    })
}

fn to_proto(value: &Value) -> prost_types::Value {
    use prost_types::value::Kind;

    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => Kind::ListValue(prost_types::ListValue { values: items.iter().map(to_proto).collect() }),
        Value::Object(map) => Kind::StructValue(prost_types::Struct {
            fields: map.iter().map(|(k, v)| (k.clone(), to_proto(v))).collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

fn from_proto(value: &prost_types::Value) -> Value {
    use prost_types::value::Kind;

    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::NumberValue(n)) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::StructValue(st)) => Value::Object(st.fields.iter().map(|(k, v)| (k.clone(), from_proto(v))).collect()),
        Some(Kind::ListValue(list)) => Value::Array(list.values.iter().map(from_proto).collect()),
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(string, optional, tag = "2")]
    parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    ts: i64,
    #[prost(string, optional, tag = "4")]
    room_id: Option<String>,
    #[prost(string, optional, tag = "5")]
    from: Option<String>,
    #[prost(string, tag = "6")]
    event: String,
    #[prost(enumeration = "WireStatus", tag = "7")]
    status: i32,
    #[prost(message, optional, tag = "8")]
    data: Option<prost_types::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireStatus {
    Request = 0,
    Done = 1,
    Error = 2,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
