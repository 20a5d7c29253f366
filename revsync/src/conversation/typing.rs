//! Users currently typing in the conversation.

use crate::models::UserId;

/// Typing users in the order they started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingSet {
    users: Vec<UserId>,
}

impl TypingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the user was already typing.
    pub fn start(&mut self, user: UserId) -> bool {
        if self.users.contains(&user) {
            return false;
        }
        self.users.push(user);
        true
    }

    /// Returns `false` if the user was not typing.
    pub fn stop(&mut self, user: &UserId) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u != user);
        self.users.len() != before
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.users.contains(user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }
}
