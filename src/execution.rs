//! Code execution requests and the single output slot.
//!
//! `run` is fire-and-forget: it emits `compileCode` and returns. Whatever
//! `codeResponse` arrives later lands in the one output slot. There is no
//! timeout, retry or cancellation, so a run that never gets an answer leaves
//! the previous output on screen.
//!
//! RESPONSE POLICY
//! ===============
//! Requests and responses are not jointly ordered, so an answer to an older
//! run can arrive after a newer run was issued.
//!
//! - [`ResponsePolicy::LatestResponse`]: every response overwrites the slot,
//!   stale ones included.
//! - [`ResponsePolicy::LatestRequest`]: the `compileCode` frame id is the
//!   request id, and only a response whose `parent_id` names the most recent
//!   request is applied. Relays that do not echo `parent_id` get nothing
//!   applied under this policy.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::OutboundEvent;
use crate::language::Language;
use crate::outbox::Outbox;

pub const DEFAULT_RUNTIME_VERSION: &str = "*";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponsePolicy {
    /// Last response to arrive wins.
    #[default]
    LatestResponse,
    /// Only the answer to the most recent request is shown.
    LatestRequest,
}

#[derive(Clone, Debug, Default)]
pub struct ExecutionGateway {
    output: String,
    policy: ResponsePolicy,
    latest_request: Option<Uuid>,
}

impl ExecutionGateway {
    #[must_use]
    pub fn new(policy: ResponsePolicy) -> Self {
        Self { output: String::new(), policy, latest_request: None }
    }

    /// Emit a `compileCode` request and return its request id immediately.
    pub fn run(&mut self, outbox: &Outbox, code: &str, room_id: &str, language: Language, version: &str) -> Uuid {
        let request_id = Uuid::new_v4();
        self.latest_request = Some(request_id);
        debug!(%request_id, %language, version, "run requested");
        outbox.emit(OutboundEvent::CompileCode {
            request_id,
            code: code.to_owned(),
            room_id: room_id.to_owned(),
            language,
            version: version.to_owned(),
        });
        request_id
    }

    /// Apply a `codeResponse`. Returns `true` if the output slot changed hands.
    pub fn on_response(&mut self, output: String, parent_id: Option<&str>) -> bool {
        if self.policy == ResponsePolicy::LatestRequest {
            let latest = self.latest_request.map(|id| id.to_string());
            if parent_id.is_none() || parent_id != latest.as_deref() {
                warn!(?parent_id, ?latest, "discarding stale code response");
                return false;
            }
        }
        self.output = output;
        true
    }

    /// Empty the output locally. The backend is not contacted.
    pub fn clear(&mut self) {
        self.output.clear();
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    #[must_use]
    pub fn policy(&self) -> ResponsePolicy {
        self.policy
    }

    #[must_use]
    pub fn latest_request(&self) -> Option<Uuid> {
        self.latest_request
    }

    pub fn reset(&mut self) {
        self.output.clear();
        self.latest_request = None;
    }
}

#[cfg(test)]
#[path = "execution_test.rs"]
mod tests;
