//! User API.

use std::sync::Arc;

use crate::{
    client::ChatClientInner,
    error::Result,
    models::{Member, ServerId, User, UserId},
};

/// API for user and member lookups.
pub struct UserApi {
    client: Arc<ChatClientInner>,
}

impl UserApi {
    pub(crate) fn new(client: Arc<ChatClientInner>) -> Self {
        Self { client }
    }

    /// Get user by ID.
    pub async fn get(&self, user_id: &UserId) -> Result<User> {
        self.client
            .authed_executor()?
            .get_json(&format!("users/{}", user_id), &[])
            .await
    }

    /// Get a user's membership in a server.
    pub async fn member(&self, server: &ServerId, user_id: &UserId) -> Result<Member> {
        self.client
            .authed_executor()?
            .get_json(&format!("servers/{}/members/{}", server, user_id), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::Error, models::UserId, ChatClient};

    #[tokio::test]
    async fn test_get_requires_session() {
        let client = ChatClient::builder().build().unwrap();
        let result = client.users().get(&UserId::new("U1")).await;
        assert!(matches!(result, Err(Error::AuthRequired)));
    }
}
