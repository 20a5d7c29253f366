//! Message models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AttachmentId, ChannelId, MessageId, UserId};

/// A chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID. Time-sortable.
    #[serde(rename = "_id")]
    pub id: MessageId,
    /// Client-chosen nonce echoed back by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Channel the message belongs to.
    pub channel: ChannelId,
    /// Author user ID.
    pub author: UserId,
    /// Text content. May be absent for attachment-only messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Uploaded files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Messages this one replies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<MessageId>,
    /// Mentioned users.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<UserId>,
    /// Link embeds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Reactions, emoji to reacting users.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reactions: BTreeMap<String, Vec<UserId>>,
    /// Time of the last edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<DateTime<Utc>>,
    /// System event marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemEvent>,
    /// Display override for bridged or bot messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<Masquerade>,
    /// Whether this message continues the group of the one before it.
    #[serde(skip)]
    pub tail: bool,
}

impl Message {
    /// Check if this message replies to anything.
    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }

    /// Check if this message is a system event.
    pub fn is_system(&self) -> bool {
        self.system.is_some()
    }

    /// Overwrite the fields present in a partial update.
    pub fn merge_partial(&mut self, partial: &PartialMessage) {
        if let Some(ref content) = partial.content {
            self.content = Some(content.clone());
        }
        if let Some(edited) = partial.edited {
            self.edited = Some(edited);
        }
        if let Some(ref embeds) = partial.embeds {
            self.embeds = embeds.clone();
        }
        if let Some(ref attachments) = partial.attachments {
            self.attachments = attachments.clone();
        }
        if let Some(ref masquerade) = partial.masquerade {
            self.masquerade = Some(masquerade.clone());
        }
    }

    /// Add resolved metadata to this message.
    pub fn apply_append(&mut self, append: &MessageAppend) {
        if let Some(ref embeds) = append.embeds {
            self.embeds.extend(embeds.iter().cloned());
        }
    }

    /// Record a reaction. Returns false if it was already present.
    pub fn add_reaction(&mut self, emoji: &str, user: &UserId) -> bool {
        let users = self.reactions.entry(emoji.to_owned()).or_default();
        if users.contains(user) {
            return false;
        }
        users.push(user.clone());
        true
    }

    /// Drop a reaction. Returns false if it was not present.
    pub fn remove_reaction(&mut self, emoji: &str, user: &UserId) -> bool {
        let Some(users) = self.reactions.get_mut(emoji) else {
            return false;
        };
        let before = users.len();
        users.retain(|u| u != user);
        let removed = users.len() != before;
        if users.is_empty() {
            self.reactions.remove(emoji);
        }
        removed
    }
}

/// Fields changed by a message edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<Masquerade>,
}

/// Metadata appended to a message after it was sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageAppend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
}

/// An uploaded file attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// File ID.
    #[serde(rename = "_id")]
    pub id: AttachmentId,
    /// Storage bucket.
    #[serde(default)]
    pub tag: String,
    /// Original file name.
    #[serde(default)]
    pub filename: String,
    /// MIME type.
    #[serde(default)]
    pub content_type: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// A link embed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

/// System event carried by a message (user joined, channel renamed, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    /// Event kind, e.g. `user_joined`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Author display override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Masquerade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_message() {
        let json = r#"{
            "_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "channel": "C1",
            "author": "U1",
            "content": "hello",
            "replies": ["01ARZ3NDEKTSV4RRFFQ69G5FAA"],
            "system": {"type": "user_joined", "id": "U2"},
            "masquerade": {"name": "Bridge"}
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id.as_str(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(msg.content.as_deref(), Some("hello"));
        assert!(msg.has_replies());
        assert!(msg.is_system());
        assert_eq!(msg.system.as_ref().unwrap().kind, "user_joined");
        assert_eq!(
            msg.masquerade,
            Some(Masquerade {
                name: Some("Bridge".into()),
                ..Default::default()
            })
        );
        assert!(!msg.tail);
    }

    #[test]
    fn test_merge_partial_keeps_absent_fields() {
        let mut msg = Message {
            id: "M1".into(),
            content: Some("old".into()),
            embeds: vec![Embed {
                url: Some("https://example.com".into()),
                ..Default::default()
            }],
            ..Default::default()
        };

        msg.merge_partial(&PartialMessage {
            content: Some("new".into()),
            ..Default::default()
        });

        assert_eq!(msg.content.as_deref(), Some("new"));
        assert_eq!(msg.embeds.len(), 1);
    }

    #[test]
    fn test_reactions() {
        let mut msg = Message::default();
        let user = UserId::new("U1");

        assert!(msg.add_reaction("👍", &user));
        assert!(!msg.add_reaction("👍", &user));
        assert_eq!(msg.reactions["👍"], vec![user.clone()]);

        assert!(msg.remove_reaction("👍", &user));
        assert!(msg.reactions.is_empty());
        assert!(!msg.remove_reaction("👍", &user));
    }

    #[test]
    fn test_apply_append() {
        let mut msg = Message::default();
        msg.apply_append(&MessageAppend {
            embeds: Some(vec![Embed::default()]),
        });
        assert_eq!(msg.embeds.len(), 1);
    }
}
