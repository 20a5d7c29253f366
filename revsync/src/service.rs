//! The chat service as seen by the conversation core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    client::ChatClient,
    error::Result,
    models::{AttachmentId, ChannelId, Member, Message, MessageId, ServerId, User, UserId},
};

/// One page of channel history, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub members: Vec<Member>,
}

/// A reply reference on an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub id: MessageId,
    /// Whether the replied-to author gets pinged.
    pub mention: bool,
}

/// Body of a message to send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<ReplyRef>,
}

/// Remote operations the conversation core depends on.
///
/// [`ChatClient`] implements this over HTTP; tests and embedders can
/// supply their own.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Fetch up to `limit` messages older than `before` (or the newest ones).
    async fn fetch_history(
        &self,
        channel: &ChannelId,
        limit: usize,
        before: Option<&MessageId>,
    ) -> Result<HistoryPage>;

    /// Mark a channel as read up to a message.
    async fn acknowledge(&self, channel: &ChannelId, message: &MessageId) -> Result<()>;

    /// Upload a file and return its ID.
    async fn upload_attachment(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<AttachmentId>;

    async fn send_message(&self, channel: &ChannelId, message: &OutgoingMessage) -> Result<()>;

    async fn edit_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        content: &str,
    ) -> Result<()>;

    async fn fetch_user(&self, id: &UserId) -> Result<User>;

    async fn fetch_member(&self, server: &ServerId, user: &UserId) -> Result<Member>;
}

#[async_trait]
impl ChatService for ChatClient {
    async fn fetch_history(
        &self,
        channel: &ChannelId,
        limit: usize,
        before: Option<&MessageId>,
    ) -> Result<HistoryPage> {
        let mut request = self.channels().history(channel.clone()).limit(limit);
        if let Some(before) = before {
            request = request.before(before.clone());
        }
        request.send().await
    }

    async fn acknowledge(&self, channel: &ChannelId, message: &MessageId) -> Result<()> {
        self.channels().acknowledge(channel, message).await
    }

    async fn upload_attachment(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<AttachmentId> {
        self.files().upload(bytes, filename, content_type).await
    }

    async fn send_message(&self, channel: &ChannelId, message: &OutgoingMessage) -> Result<()> {
        self.channels().send(channel, message).await
    }

    async fn edit_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        content: &str,
    ) -> Result<()> {
        self.channels().edit(channel, message, content).await
    }

    async fn fetch_user(&self, id: &UserId) -> Result<User> {
        self.users().get(id).await
    }

    async fn fetch_member(&self, server: &ServerId, user: &UserId) -> Result<Member> {
        self.users().member(server, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_message_json() {
        let msg = OutgoingMessage {
            content: "hi".into(),
            attachments: vec![],
            replies: vec![ReplyRef {
                id: "M1".into(),
                mention: true,
            }],
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": "hi", "replies": [{"id": "M1", "mention": true}]})
        );
    }

    #[test]
    fn test_history_page_with_users() {
        let json = r#"{
            "messages": [{"_id": "M1", "channel": "C1", "author": "U1"}],
            "users": [{"_id": "U1", "username": "alice"}]
        }"#;

        let page: HistoryPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.users[0].username, "alice");
        assert!(page.members.is_empty());
    }
}
