//! Shared code buffer and language mode.
//!
//! DESIGN
//! ======
//! Whole-buffer last-write-wins. Local edits are broadcast in full; remote
//! replacements overwrite whatever is here, pending local edits included.
//! Two members typing at once can clobber each other, and the final content
//! depends only on arrival order at each client. No merge is attempted.

use tracing::debug;

use crate::events::OutboundEvent;
use crate::language::Language;
use crate::outbox::Outbox;

pub const DEFAULT_INITIAL_CODE: &str = "// start code here";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buffer {
    content: String,
    language: Language,
    /// Content restored by [`Buffer::reset`].
    initial: String,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CODE)
    }
}

impl Buffer {
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        Self { content: initial.clone(), language: Language::default(), initial }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Store a local edit and broadcast the whole buffer.
    pub fn apply_local_edit(&mut self, outbox: &Outbox, room_id: &str, content: String) {
        self.content.clone_from(&content);
        outbox.emit(OutboundEvent::CodeChange { room_id: room_id.to_owned(), code: content });
    }

    /// Overwrite the buffer with a peer's content. Last writer wins.
    pub fn apply_remote_replacement(&mut self, content: String) {
        debug!(len = content.len(), "remote buffer replacement");
        self.content = content;
    }

    /// Change the language locally and broadcast it.
    ///
    /// Unknown names fall back to JavaScript; the validated value is what gets
    /// stored and broadcast.
    pub fn set_language(&mut self, outbox: &Outbox, room_id: &str, raw: &str) -> Language {
        let language = Language::parse_or_default(raw);
        self.language = language;
        outbox.emit(OutboundEvent::LanguageChange { room_id: room_id.to_owned(), language });
        language
    }

    /// Apply a peer's language change. Never re-emits.
    pub fn apply_remote_language(&mut self, raw: &str) -> Language {
        self.language = Language::parse_or_default(raw);
        self.language
    }

    /// Load file content, infer the language from `file_name`, and broadcast
    /// both (`codeChange` first, then `languageChange`).
    pub fn import_from_file(&mut self, outbox: &Outbox, room_id: &str, file_name: &str, content: String) -> Language {
        let language = Language::from_file_name(file_name);
        self.language = language;
        self.apply_local_edit(outbox, room_id, content);
        outbox.emit(OutboundEvent::LanguageChange { room_id: room_id.to_owned(), language });
        language
    }

    /// Content to persist locally. Not part of the sync protocol.
    #[must_use]
    pub fn export(&self) -> &str {
        &self.content
    }

    pub fn reset(&mut self) {
        self.content.clone_from(&self.initial);
        self.language = Language::default();
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod tests;
