//! Session state.

use crate::models::UserId;

/// Session credentials for the chat service.
#[derive(Clone)]
pub struct Session {
    /// Session token, sent as `x-session-token`.
    pub token: String,
    /// ID of the logged-in user, if known.
    pub user_id: Option<UserId>,
}

impl Session {
    /// Create a new session.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: None,
        }
    }

    /// Attach the logged-in user's ID.
    pub fn with_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Check if the session looks usable.
    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_validity() {
        assert!(Session::new("token123").is_valid());
        assert!(!Session::new("").is_valid());
        assert!(!Session::new("   ").is_valid());
    }

    #[test]
    fn test_debug_hides_token() {
        let session = Session::new("secret").with_user("U1");
        let out = format!("{:?}", session);
        assert!(!out.contains("secret"));
        assert!(out.contains("U1"));
    }
}
