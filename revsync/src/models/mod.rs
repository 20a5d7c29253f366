//! Data models for chat entities.

mod ids;
mod message;
mod user;

pub use ids::{
    ulid_time_prefix, ulid_timestamp_ms, AttachmentId, ChannelId, MessageId, ServerId, UserId,
};
pub use message::{
    Attachment, Embed, Masquerade, Message, MessageAppend, PartialMessage, SystemEvent,
};
pub use user::{Member, MemberId, User};
