//! Scoped user, member and message directory.

use std::sync::Arc;

use crate::{
    error::Result,
    models::{ChannelId, Member, Message, MessageId, ServerId, User, UserId},
    service::{ChatService, HistoryPage},
};

use super::{CacheStorage, CacheStorageExt, MemoryCache};

fn user_key(id: &UserId) -> String {
    format!("user/{}", id)
}

fn member_key(server: &ServerId, user: &UserId) -> String {
    format!("member/{}/{}", server, user)
}

fn message_key(id: &MessageId) -> String {
    format!("message/{}", id)
}

fn read_key(channel: &ChannelId) -> String {
    format!("read/{}", channel)
}

/// Lookup tables shared by the conversations of one session.
///
/// Everything lives in a [`CacheStorage`] backend, so a directory is cheap
/// to clone and all clones see the same entries.
#[derive(Debug, Clone)]
pub struct Directory {
    storage: Arc<dyn CacheStorage>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Directory {
    /// Create a directory on top of a storage backend.
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    /// Create a directory backed by a fresh [`MemoryCache`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    pub async fn user(&self, id: &UserId) -> Option<User> {
        self.storage.get_json(&user_key(id)).await
    }

    pub async fn has_user(&self, id: &UserId) -> bool {
        self.storage.contains(&user_key(id)).await
    }

    pub async fn put_user(&self, user: &User) -> Result<()> {
        self.storage.set_json(&user_key(&user.id), user).await
    }

    pub async fn member(&self, server: &ServerId, user: &UserId) -> Option<Member> {
        self.storage.get_json(&member_key(server, user)).await
    }

    pub async fn has_member(&self, server: &ServerId, user: &UserId) -> bool {
        self.storage.contains(&member_key(server, user)).await
    }

    pub async fn put_member(&self, member: &Member) -> Result<()> {
        let key = member_key(&member.id.server, &member.id.user);
        self.storage.set_json(&key, member).await
    }

    /// Latest cached copy of a message.
    pub async fn message(&self, id: &MessageId) -> Option<Message> {
        self.storage.get_json(&message_key(id)).await
    }

    pub async fn put_message(&self, message: &Message) -> Result<()> {
        self.storage
            .set_json(&message_key(&message.id), message)
            .await
    }

    pub async fn remove_message(&self, id: &MessageId) {
        self.storage.remove(&message_key(id)).await;
    }

    /// Drop the cached copies of messages, e.g. when their conversation
    /// closes. Users, members and read markers are kept.
    pub async fn forget_messages<'a>(&self, ids: impl IntoIterator<Item = &'a MessageId>) {
        for id in ids {
            self.remove_message(id).await;
        }
    }

    /// Last message the user is known to have read in a channel.
    pub async fn read_marker(&self, channel: &ChannelId) -> Option<MessageId> {
        self.storage.get_json(&read_key(channel)).await
    }

    /// Move the local read marker forward. Older IDs are ignored.
    pub async fn mark_read(&self, channel: &ChannelId, message: &MessageId) -> Result<bool> {
        if let Some(current) = self.read_marker(channel).await {
            if current >= *message {
                return Ok(false);
            }
        }
        self.storage
            .set_json(&read_key(channel), message)
            .await?;
        Ok(true)
    }

    /// Fetch and store a user unless it is already known.
    ///
    /// Returns `true` if a fetch happened.
    pub async fn ensure_user(&self, service: &dyn ChatService, id: &UserId) -> Result<bool> {
        if self.has_user(id).await {
            return Ok(false);
        }
        log::debug!("Fetching unknown user {}", id);
        let user = service.fetch_user(id).await?;
        self.put_user(&user).await?;
        Ok(true)
    }

    /// Fetch and store a server member unless it is already known.
    pub async fn ensure_member(
        &self,
        service: &dyn ChatService,
        server: &ServerId,
        user: &UserId,
    ) -> Result<bool> {
        if self.has_member(server, user).await {
            return Ok(false);
        }
        log::debug!("Fetching unknown member {} of {}", user, server);
        let member = service.fetch_member(server, user).await?;
        self.put_member(&member).await?;
        Ok(true)
    }

    /// Store the users, members and messages that came with a history page.
    ///
    /// Existing entries win: a page may be older than what realtime events
    /// have already delivered.
    pub async fn absorb_page(&self, page: &HistoryPage) -> Result<()> {
        for user in &page.users {
            if !self.has_user(&user.id).await {
                self.put_user(user).await?;
            }
        }
        for member in &page.members {
            if !self.has_member(&member.id.server, &member.id.user).await {
                self.put_member(member).await?;
            }
        }
        for message in &page.messages {
            if self.message(&message.id).await.is_none() {
                self.put_message(message).await?;
            }
        }
        Ok(())
    }
}
