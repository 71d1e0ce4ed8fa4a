//! Session lifecycle controller.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `Session` per client process. It owns the outbox and every piece of
//! room state (presence, typing notice, buffer, execution output), and is
//! the only place user actions and inbound events enter. Components never
//! talk to each other; the session routes.
//!
//! LIFECYCLE
//! =========
//! `NotJoined --join--> Joined --leave--> Left --join--> Joined ...`
//!
//! Joining is fire-and-forget: the `join` event is queued and the session is
//! `Joined` immediately, with no acknowledgment. Leaving (explicitly, or on
//! drop) queues `leaveRoom` and resets everything to defaults.

use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use crate::buffer::Buffer;
use crate::config::SessionConfig;
use crate::events::{InboundEvent, OutboundEvent};
use crate::execution::ExecutionGateway;
use crate::language::Language;
use crate::outbox::Outbox;
use crate::presence::Presence;
use crate::typing::TypingIndicator;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MembershipState {
    #[default]
    NotJoined,
    Joined,
    Left,
}

/// Errors reported straight back to the local user. Nothing is sent when
/// one of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Enter both RoomID & Username")]
    MissingRoomIdAndUsername,
    #[error("Please enter RoomId.")]
    MissingRoomId,
    #[error("Please enter Username.")]
    MissingUsername,
    #[error("already joined room {0}")]
    AlreadyJoined(String),
    #[error("not joined to a room")]
    NotJoined,
}

/// Everything a UI needs to render one frame of the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionView {
    pub state: MembershipState,
    pub room_id: String,
    pub username: String,
    pub members: Vec<String>,
    /// Typing notice, empty when nobody is typing.
    pub typing: String,
    pub content: String,
    pub language: Language,
    pub output: String,
}

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    outbox: Outbox,
    state: MembershipState,
    room_id: String,
    username: String,
    presence: Presence,
    typing: TypingIndicator,
    buffer: Buffer,
    execution: ExecutionGateway,
}

impl Session {
    #[must_use]
    pub fn new(config: SessionConfig, outbox: Outbox) -> Self {
        Self {
            typing: TypingIndicator::new(config.typing_timeout),
            buffer: Buffer::new(config.initial_code.clone()),
            execution: ExecutionGateway::new(config.response_policy),
            presence: Presence::default(),
            state: MembershipState::NotJoined,
            room_id: String::new(),
            username: String::new(),
            outbox,
            config,
        }
    }

    /// Fresh random room id for "create new room".
    #[must_use]
    pub fn new_room_id() -> String {
        Uuid::new_v4().to_string()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Join `room_id` as `username`.
    ///
    /// Both values must be non-blank. Room state is reset before the `join`
    /// event goes out, so a rejoin after leaving starts clean.
    pub fn join(&mut self, room_id: &str, username: &str) -> Result<(), SessionError> {
        if self.state == MembershipState::Joined {
            return Err(SessionError::AlreadyJoined(self.room_id.clone()));
        }
        validate_join(room_id, username)?;

        self.reset_room_state();
        self.room_id = room_id.to_owned();
        self.username = username.to_owned();
        self.state = MembershipState::Joined;
        self.outbox.emit(OutboundEvent::Join { room_id: self.room_id.clone(), username: self.username.clone() });
        info!(room_id = %self.room_id, username = %self.username, "joined room");
        Ok(())
    }

    /// Leave the current room and reset all room state.
    pub fn leave(&mut self) -> Result<(), SessionError> {
        self.require_joined()?;
        self.outbox.emit(OutboundEvent::LeaveRoom);
        info!(room_id = %self.room_id, username = %self.username, "left room");
        self.reset_room_state();
        self.room_id.clear();
        self.username.clear();
        self.state = MembershipState::Left;
        Ok(())
    }

    /// Best-effort leave on shutdown. Delivery is not awaited.
    pub fn teardown(&mut self) {
        if self.state == MembershipState::Joined {
            // Cannot fail: joined was just checked.
            let _ = self.leave();
        }
    }

    // =========================================================================
    // LOCAL ACTIONS
    // =========================================================================

    /// Local keystroke-driven edit: broadcast the buffer, then a typing signal.
    pub fn edit(&mut self, content: impl Into<String>) -> Result<(), SessionError> {
        self.require_joined()?;
        self.buffer.apply_local_edit(&self.outbox, &self.room_id, content.into());
        self.typing.on_local_edit(&self.outbox, &self.room_id, &self.username);
        Ok(())
    }

    /// Select a language mode; unknown names become JavaScript.
    pub fn set_language(&mut self, raw: &str) -> Result<Language, SessionError> {
        self.require_joined()?;
        Ok(self.buffer.set_language(&self.outbox, &self.room_id, raw))
    }

    /// Load file content into the buffer, picking the language from the name.
    pub fn import_file(&mut self, file_name: &str, content: impl Into<String>) -> Result<Language, SessionError> {
        self.require_joined()?;
        let language = self.buffer.import_from_file(&self.outbox, &self.room_id, file_name, content.into());
        info!(file_name, %language, "imported file into buffer");
        Ok(language)
    }

    /// Current buffer content for local saving.
    #[must_use]
    pub fn export(&self) -> &str {
        self.buffer.export()
    }

    /// Send the buffer for execution. The result arrives later as an inbound event.
    pub fn run(&mut self) -> Result<Uuid, SessionError> {
        self.require_joined()?;
        Ok(self.execution.run(
            &self.outbox,
            self.buffer.content(),
            &self.room_id,
            self.buffer.language(),
            &self.config.runtime_version,
        ))
    }

    pub fn clear_output(&mut self) {
        self.execution.clear();
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Apply an event from the relay. Returns `true` if visible state changed.
    ///
    /// Events that arrive while not joined are dropped.
    pub fn handle_inbound(&mut self, event: InboundEvent, now: Instant) -> bool {
        if self.state != MembershipState::Joined {
            debug!(event = event.name(), state = ?self.state, "dropping inbound event outside a room");
            return false;
        }

        match event {
            InboundEvent::UserJoined(members) => {
                debug!(count = members.len(), "membership snapshot");
                self.presence.on_membership_event(members);
                true
            }
            InboundEvent::CodeUpdate(code) => {
                self.buffer.apply_remote_replacement(code);
                true
            }
            InboundEvent::UserTyping(username) => {
                self.typing.on_remote_typing(&username, now);
                true
            }
            InboundEvent::LanguageUpdate(raw) => {
                let language = self.buffer.apply_remote_language(&raw);
                debug!(%language, "remote language change");
                true
            }
            InboundEvent::CodeResponse { output, parent_id } => self.execution.on_response(output, parent_id.as_deref()),
        }
    }

    /// Advance timers. Returns `true` if visible state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.typing.tick(now)
    }

    /// Earliest instant at which [`Session::tick`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.typing.deadline()
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> MembershipState {
        self.state
    }

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn members(&self) -> &[String] {
        self.presence.members()
    }

    #[must_use]
    pub fn typing_text(&self) -> &str {
        self.typing.display_text()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        self.buffer.content()
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.buffer.language()
    }

    #[must_use]
    pub fn output(&self) -> &str {
        self.execution.output()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            room_id: self.room_id.clone(),
            username: self.username.clone(),
            members: self.presence.members().to_vec(),
            typing: self.typing.display_text().to_owned(),
            content: self.buffer.content().to_owned(),
            language: self.buffer.language(),
            output: self.execution.output().to_owned(),
        }
    }

    fn require_joined(&self) -> Result<(), SessionError> {
        if self.state == MembershipState::Joined { Ok(()) } else { Err(SessionError::NotJoined) }
    }

    fn reset_room_state(&mut self) {
        self.presence.clear();
        self.typing.reset();
        self.buffer.reset();
        self.execution.reset();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn validate_join(room_id: &str, username: &str) -> Result<(), SessionError> {
    match (room_id.trim().is_empty(), username.trim().is_empty()) {
        (true, true) => Err(SessionError::MissingRoomIdAndUsername),
        (true, false) => Err(SessionError::MissingRoomId),
        (false, true) => Err(SessionError::MissingUsername),
        (false, false) => Ok(()),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
