//! Room membership as last reported by the relay.
//!
//! The snapshot is replaced wholesale on every `userJoined` event. Nobody is
//! diffed; a user missing from the latest list has left.

/// Latest membership list for the joined room.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Presence {
    members: Vec<String>,
}

impl Presence {
    /// Replace the snapshot verbatim, duplicates and order included.
    pub fn on_membership_event(&mut self, members: Vec<String>) {
        self.members = members;
    }

    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
