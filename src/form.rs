//! Join form state.
//!
//! Holds what the user has typed before joining. Submitting (button or
//! Enter) hands both fields to [`Session::join`], which does the validation.

use crate::session::{Session, SessionError};

const SUBMIT_KEY: &str = "Enter";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinForm {
    pub room_id: String,
    pub username: String,
}

impl JoinForm {
    /// Fill the room field with a fresh random id and return it.
    pub fn create_new_room(&mut self) -> &str {
        self.room_id = Session::new_room_id();
        &self.room_id
    }

    pub fn submit(&self, session: &mut Session) -> Result<(), SessionError> {
        session.join(&self.room_id, &self.username)
    }

    /// Key press inside either field. `Enter` submits; other keys do nothing
    /// and return `None`.
    pub fn on_key(&self, key: &str, session: &mut Session) -> Option<Result<(), SessionError>> {
        (key == SUBMIT_KEY).then(|| self.submit(session))
    }
}

#[cfg(test)]
#[path = "form_test.rs"]
mod tests;
