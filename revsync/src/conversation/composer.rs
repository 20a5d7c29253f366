//! Pending outbound state: the message being written.

use serde::Serialize;

use crate::{
    models::MessageId,
    service::{OutgoingMessage, ReplyRef},
};

/// Attachments sent with a single message.
pub const MAX_ATTACHMENTS_PER_MESSAGE: usize = 5;

/// Replies a single message may reference.
pub const MAX_REPLIES_PER_MESSAGE: usize = 5;

/// A file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl PendingAttachment {
    pub fn new(
        bytes: Vec<u8>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }
}

/// Text, selection, attachments and replies of the message being composed.
///
/// Selection offsets count characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    content: String,
    selection: (usize, usize),
    attachments: Vec<PendingAttachment>,
    replies: Vec<ReplyRef>,
    editing: Option<MessageId>,
    upload_progress: f32,
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(idx, _)| idx)
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the text and put the cursor at its end.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        let end = self.content.chars().count();
        self.selection = (end, end);
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.selection = (start.min(end), start.max(end));
    }

    /// Replace the selection with `text` and place the cursor after it.
    ///
    /// A selection starting past the end of the content appends instead.
    pub fn insert_at_cursor(&mut self, text: &str) {
        let len = self.content.chars().count();
        let (start, end) = self.selection;

        if start > len {
            self.content.push_str(text);
            let end = self.content.chars().count();
            self.selection = (end, end);
            return;
        }

        let from = byte_offset(&self.content, start);
        let to = byte_offset(&self.content, end.min(len));
        self.content.replace_range(from..to, text);

        let cursor = start + text.chars().count();
        self.selection = (cursor, cursor);
    }

    pub fn queue_attachment(&mut self, attachment: PendingAttachment) {
        self.attachments.push(attachment);
    }

    /// Remove a queued attachment by position.
    pub fn remove_attachment(&mut self, index: usize) -> Option<PendingAttachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    pub fn attachments(&self) -> &[PendingAttachment] {
        &self.attachments
    }

    /// The attachments the next send will upload.
    pub fn next_batch(&self) -> &[PendingAttachment] {
        let n = self.attachments.len().min(MAX_ATTACHMENTS_PER_MESSAGE);
        &self.attachments[..n]
    }

    /// Reply to a message, without mention. Returns `false` if it is already
    /// a reply target or the reply list is full.
    pub fn add_reply(&mut self, id: MessageId) -> bool {
        if self.replies.len() >= MAX_REPLIES_PER_MESSAGE || self.replies.iter().any(|r| r.id == id)
        {
            return false;
        }
        self.replies.push(ReplyRef { id, mention: false });
        true
    }

    /// Flip the mention flag of a pending reply. Returns `false` if absent.
    pub fn toggle_mention(&mut self, id: &MessageId) -> bool {
        match self.replies.iter_mut().find(|r| &r.id == id) {
            Some(reply) => {
                reply.mention = !reply.mention;
                true
            }
            None => false,
        }
    }

    pub fn remove_reply(&mut self, id: &MessageId) -> bool {
        let before = self.replies.len();
        self.replies.retain(|r| &r.id != id);
        self.replies.len() != before
    }

    pub fn clear_replies(&mut self) {
        self.replies.clear();
    }

    pub fn replies(&self) -> &[ReplyRef] {
        &self.replies
    }

    /// Switch to editing a message, loading its current content.
    pub fn begin_edit(&mut self, id: MessageId, content: Option<&str>) {
        self.editing = Some(id);
        if let Some(content) = content {
            self.set_content(content);
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.set_content(String::new());
    }

    pub fn editing(&self) -> Option<&MessageId> {
        self.editing.as_ref()
    }

    pub fn upload_progress(&self) -> f32 {
        self.upload_progress
    }

    pub fn set_upload_progress(&mut self, progress: f32) {
        self.upload_progress = progress.clamp(0.0, 1.0);
    }

    /// Check if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.attachments.is_empty()
    }

    /// Message body for the current text and replies, without attachments.
    pub fn outgoing(&self) -> OutgoingMessage {
        OutgoingMessage {
            content: self.content.trim().to_owned(),
            attachments: Vec::new(),
            replies: self.replies.clone(),
        }
    }

    /// Reset after a successful send that uploaded the first `consumed`
    /// attachments. Callers must not remove attachments while a send runs.
    pub fn finish_send(&mut self, consumed: usize) {
        self.set_content(String::new());
        let n = consumed.min(self.attachments.len());
        self.attachments.drain(..n);
        self.clear_replies();
        self.upload_progress = 0.0;
    }

    pub fn state(&self) -> ComposerState {
        ComposerState {
            content: self.content.clone(),
            selection: self.selection,
            attachments: self.attachments.iter().map(|a| a.filename.clone()).collect(),
            replies: self.replies.clone(),
            editing: self.editing.clone(),
            upload_progress: self.upload_progress,
        }
    }
}

/// Renderable view of a [`Composer`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposerState {
    pub content: String,
    pub selection: (usize, usize),
    /// File names of queued attachments.
    pub attachments: Vec<String>,
    pub replies: Vec<ReplyRef>,
    pub editing: Option<MessageId>,
    pub upload_progress: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(name: &str) -> PendingAttachment {
        PendingAttachment::new(b"data".to_vec(), name, "text/plain")
    }

    #[test]
    fn test_insert_at_cursor_replaces_selection() {
        let mut composer = Composer::new();
        composer.set_content("hello world");
        composer.set_selection(6, 11);
        composer.insert_at_cursor("there");
        assert_eq!(composer.content(), "hello there");
        assert_eq!(composer.selection(), (11, 11));
    }

    #[test]
    fn test_insert_at_cursor_counts_chars() {
        let mut composer = Composer::new();
        composer.set_content("héllo");
        composer.set_selection(2, 2);
        composer.insert_at_cursor("😀");
        assert_eq!(composer.content(), "hé😀llo");
        assert_eq!(composer.selection(), (3, 3));
    }

    #[test]
    fn test_insert_out_of_bounds_appends() {
        let mut composer = Composer::new();
        composer.set_content("abc");
        composer.set_selection(10, 10);
        composer.insert_at_cursor("!");
        assert_eq!(composer.content(), "abc!");
        assert_eq!(composer.selection(), (4, 4));
    }

    #[test]
    fn test_reply_bound_and_dedupe() {
        let mut composer = Composer::new();
        assert!(composer.add_reply("M0".into()));
        assert!(!composer.add_reply("M0".into()));
        for i in 1..MAX_REPLIES_PER_MESSAGE {
            assert!(composer.add_reply(format!("M{i}").into()));
        }
        assert!(!composer.add_reply("M9".into()));
        assert_eq!(composer.replies().len(), MAX_REPLIES_PER_MESSAGE);
    }

    #[test]
    fn test_toggle_mention_is_per_reply() {
        let mut composer = Composer::new();
        composer.add_reply("M1".into());
        composer.add_reply("M2".into());

        assert!(composer.toggle_mention(&"M2".into()));
        assert_eq!(
            composer.replies(),
            &[
                ReplyRef { id: "M1".into(), mention: false },
                ReplyRef { id: "M2".into(), mention: true },
            ]
        );
        assert!(!composer.toggle_mention(&"M3".into()));
    }

    #[test]
    fn test_attachment_batches() {
        let mut composer = Composer::new();
        for i in 0..7 {
            composer.queue_attachment(file(&format!("f{i}")));
        }
        assert_eq!(composer.next_batch().len(), MAX_ATTACHMENTS_PER_MESSAGE);

        composer.set_content("text");
        composer.add_reply("M1".into());
        composer.finish_send(MAX_ATTACHMENTS_PER_MESSAGE);
        assert_eq!(composer.content(), "");
        assert!(composer.replies().is_empty());
        let left: Vec<_> = composer.attachments().iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(left, vec!["f5", "f6"]);
        assert_eq!(composer.next_batch().len(), 2);
    }

    #[test]
    fn test_edit_cycle() {
        let mut composer = Composer::new();
        composer.begin_edit("M1".into(), Some("original"));
        assert_eq!(composer.editing(), Some(&MessageId::new("M1")));
        assert_eq!(composer.content(), "original");
        assert_eq!(composer.selection(), (8, 8));

        composer.cancel_edit();
        assert_eq!(composer.editing(), None);
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn test_outgoing_trims_content() {
        let mut composer = Composer::new();
        composer.set_content("  hi \n");
        composer.add_reply("M1".into());
        let out = composer.outgoing();
        assert_eq!(out.content, "hi");
        assert_eq!(out.replies.len(), 1);
    }

    #[test]
    fn test_is_empty() {
        let mut composer = Composer::new();
        composer.set_content("   ");
        assert!(composer.is_empty());
        composer.queue_attachment(file("a"));
        assert!(!composer.is_empty());
    }
}
