//! Realtime frame definitions.

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    models::{ChannelId, Message, MessageAppend, MessageId, PartialMessage, UserId},
};

/// A frame received from the realtime event stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum RealtimeFrame {
    /// A new message was sent.
    Message(Message),

    /// Message content was edited.
    MessageUpdate {
        id: MessageId,
        channel: ChannelId,
        data: PartialMessage,
    },

    /// Metadata such as embeds was resolved for a message.
    MessageAppend {
        id: MessageId,
        channel: ChannelId,
        append: MessageAppend,
    },

    MessageDelete {
        id: MessageId,
        channel: ChannelId,
    },

    MessageReact {
        id: MessageId,
        channel_id: ChannelId,
        user_id: UserId,
        emoji_id: String,
    },

    MessageUnreact {
        id: MessageId,
        channel_id: ChannelId,
        user_id: UserId,
        emoji_id: String,
    },

    /// `id` is the channel.
    ChannelStartTyping {
        id: ChannelId,
        user: UserId,
    },

    /// `id` is the channel.
    ChannelStopTyping {
        id: ChannelId,
        user: UserId,
    },

    /// The transport re-established its connection.
    #[serde(skip)]
    Reconnected,

    /// Any frame type this crate does not handle.
    #[serde(other)]
    Unknown,
}

impl RealtimeFrame {
    /// Decode a frame from its JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(Error::Json)
    }

    /// Channel this frame is scoped to, if any.
    pub fn channel(&self) -> Option<&ChannelId> {
        match self {
            RealtimeFrame::Message(message) => Some(&message.channel),
            RealtimeFrame::MessageUpdate { channel, .. }
            | RealtimeFrame::MessageAppend { channel, .. }
            | RealtimeFrame::MessageDelete { channel, .. } => Some(channel),
            RealtimeFrame::MessageReact { channel_id, .. }
            | RealtimeFrame::MessageUnreact { channel_id, .. } => Some(channel_id),
            RealtimeFrame::ChannelStartTyping { id, .. }
            | RealtimeFrame::ChannelStopTyping { id, .. } => Some(id),
            RealtimeFrame::Reconnected | RealtimeFrame::Unknown => None,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RealtimeFrame::Message(_) => "Message",
            RealtimeFrame::MessageUpdate { .. } => "MessageUpdate",
            RealtimeFrame::MessageAppend { .. } => "MessageAppend",
            RealtimeFrame::MessageDelete { .. } => "MessageDelete",
            RealtimeFrame::MessageReact { .. } => "MessageReact",
            RealtimeFrame::MessageUnreact { .. } => "MessageUnreact",
            RealtimeFrame::ChannelStartTyping { .. } => "ChannelStartTyping",
            RealtimeFrame::ChannelStopTyping { .. } => "ChannelStopTyping",
            RealtimeFrame::Reconnected => "Reconnected",
            RealtimeFrame::Unknown => "Unknown",
        }
    }
}
