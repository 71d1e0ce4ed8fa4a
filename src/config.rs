//! Runtime configuration parsed from environment variables.
//!
//! Unknown enum values are errors; numbers that fail to parse fall back to
//! their defaults.

use std::time::Duration;

use frames::Encoding;

use crate::buffer::DEFAULT_INITIAL_CODE;
use crate::execution::{DEFAULT_RUNTIME_VERSION, ResponsePolicy};
use crate::typing::{DEFAULT_TYPING_TIMEOUT, DEFAULT_TYPING_TIMEOUT_MS};

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:5000/ws";
pub const DEFAULT_RECONNECT_MIN_MS: u64 = 1000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Settings consumed by the session state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub typing_timeout: Duration,
    /// Runtime version sent with every `compileCode`.
    pub runtime_version: String,
    pub response_policy: ResponsePolicy,
    /// Buffer content at start, after join, and after leave.
    pub initial_code: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
            runtime_version: DEFAULT_RUNTIME_VERSION.to_owned(),
            response_policy: ResponsePolicy::default(),
            initial_code: DEFAULT_INITIAL_CODE.to_owned(),
        }
    }
}

/// Settings consumed by the relay transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    pub relay_url: String,
    pub encoding: Encoding,
    pub reconnect_min: Duration,
    pub reconnect_max: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_owned(),
            encoding: Encoding::default(),
            reconnect_min: Duration::from_millis(DEFAULT_RECONNECT_MIN_MS),
            reconnect_max: Duration::from_millis(DEFAULT_RECONNECT_MAX_MS),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub session: SessionConfig,
    pub transport: TransportConfig,
}

impl Config {
    /// Build config from the process environment.
    ///
    /// - `CODEROOM_RELAY_URL`: relay WebSocket URL
    /// - `CODEROOM_ENCODING`: `json` (default) or `binary`
    /// - `CODEROOM_TYPING_TIMEOUT_MS`: default 2000
    /// - `CODEROOM_RUNTIME_VERSION`: default `*`
    /// - `CODEROOM_RESPONSE_POLICY`: `latest_response` (default) or `latest_request`
    /// - `CODEROOM_INITIAL_CODE`: starter buffer content
    /// - `CODEROOM_RECONNECT_MIN_MS` / `CODEROOM_RECONNECT_MAX_MS`: backoff bounds
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let encoding = parse_encoding(lookup("CODEROOM_ENCODING").as_deref())?;
        let response_policy = parse_policy(lookup("CODEROOM_RESPONSE_POLICY").as_deref())?;
        let millis = |key: &str, default: u64| {
            Duration::from_millis(lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default))
        };

        let session = SessionConfig {
            typing_timeout: millis("CODEROOM_TYPING_TIMEOUT_MS", DEFAULT_TYPING_TIMEOUT_MS),
            runtime_version: lookup("CODEROOM_RUNTIME_VERSION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_RUNTIME_VERSION.to_owned()),
            response_policy,
            initial_code: lookup("CODEROOM_INITIAL_CODE").unwrap_or_else(|| DEFAULT_INITIAL_CODE.to_owned()),
        };

        let reconnect_min = millis("CODEROOM_RECONNECT_MIN_MS", DEFAULT_RECONNECT_MIN_MS);
        let transport = TransportConfig {
            relay_url: lookup("CODEROOM_RELAY_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_RELAY_URL.to_owned()),
            encoding,
            reconnect_min,
            reconnect_max: millis("CODEROOM_RECONNECT_MAX_MS", DEFAULT_RECONNECT_MAX_MS).max(reconnect_min),
        };

        Ok(Self { session, transport })
    }
}

fn parse_encoding(raw: Option<&str>) -> Result<Encoding, ConfigError> {
    match raw.unwrap_or("json") {
        "json" => Ok(Encoding::Json),
        "binary" => Ok(Encoding::Binary),
        other => Err(ConfigError::InvalidValue { var: "CODEROOM_ENCODING", value: other.to_owned() }),
    }
}

fn parse_policy(raw: Option<&str>) -> Result<ResponsePolicy, ConfigError> {
    match raw.unwrap_or("latest_response") {
        "latest_response" => Ok(ResponsePolicy::LatestResponse),
        "latest_request" => Ok(ResponsePolicy::LatestRequest),
        other => Err(ConfigError::InvalidValue { var: "CODEROOM_RESPONSE_POLICY", value: other.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
