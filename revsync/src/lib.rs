//! Client library for Revolt-style chat: HTTP access to the chat service and
//! the realtime-synchronised state of an open conversation.

pub mod api;
pub mod cache;
pub mod client;
pub mod conversation;
pub mod error;
pub mod models;
pub mod realtime;
pub mod service;

#[cfg(test)]
mod testing;

// Re-export main types
pub use client::{ChatClient, ChatClientBuilder, HttpConfig, Session};
pub use error::{Error, Result};

// Re-export commonly used models
pub use models::{
    Attachment, AttachmentId, ChannelId, Embed, Masquerade, Member, MemberId, Message,
    MessageAppend, MessageId, PartialMessage, ServerId, SystemEvent, User, UserId,
};

pub use cache::Directory;
pub use conversation::{
    Command, Composer, ControllerConfig, ConversationController, ConversationSnapshot,
    MessageStore, PendingAttachment,
};
pub use realtime::{RealtimeFrame, RealtimeHub, Subscription};
pub use service::{ChatService, HistoryPage, OutgoingMessage, ReplyRef};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = ChatClient::builder().build();
        assert!(client.is_ok());

        let client = client.unwrap();
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_client_with_session() {
        let client = ChatClient::builder()
            .with_session(Session::new("test_token").with_user("U1"))
            .build()
            .unwrap();

        assert!(client.is_authenticated());
        assert_eq!(
            client.session().and_then(|s| s.user_id.as_ref()),
            Some(&UserId::new("U1"))
        );
    }
}
