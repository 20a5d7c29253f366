//! Channel handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use revsync::{
    conversation::regroup, ChannelId, ChatClient, Command, ConversationController, Directory,
    MessageId, PendingAttachment, ServerId,
};
use serde::Serialize;

use crate::output::MessageRow;

/// A page of channel history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResult {
    pub channel: String,
    /// Oldest first.
    pub messages: Vec<MessageRow>,
    /// Cursor for the next older page.
    pub before: Option<String>,
}

/// Fetch one page of history with grouping applied.
pub async fn history(
    client: &ChatClient,
    channel: &str,
    limit: usize,
    before: Option<&str>,
) -> Result<HistoryResult> {
    let mut request = client.channels().history(channel).limit(limit);
    if let Some(before) = before {
        request = request.before(before);
    }
    let page = request.send().await.context("Failed to fetch history")?;

    let mut messages = page.messages;
    regroup(&mut messages);

    Ok(HistoryResult {
        channel: channel.to_string(),
        before: (messages.len() == limit)
            .then(|| messages.last().map(|m| m.id.to_string()))
            .flatten(),
        messages: MessageRow::transcript(&messages, &page.users),
    })
}

/// A reply target given on the command line.
#[derive(Debug, Clone)]
pub struct ReplyArg {
    pub id: String,
    pub mention: bool,
}

/// Outcome of a send.
#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub channel: String,
    /// Messages it took to carry all attachments.
    pub messages: usize,
    pub attachments: usize,
}

/// Read a file into a queued attachment.
pub fn read_attachment(path: &Path) -> Result<PendingAttachment> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Attachment path has no file name")?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(PendingAttachment::new(bytes, filename, content_type.essence_str()))
}

fn controller(
    client: &ChatClient,
    channel: &str,
    server: Option<&str>,
    directory: Directory,
) -> ConversationController {
    let ctl = ConversationController::new(ChannelId::new(channel), Arc::new(client.clone()), directory);
    match server {
        Some(server) => ctl.in_server(ServerId::new(server)),
        None => ctl,
    }
}

/// Send a message. Attachments beyond one message's limit go out in
/// follow-up messages.
pub async fn send(
    client: &ChatClient,
    channel: &str,
    content: &str,
    replies: &[ReplyArg],
    attachments: &[PathBuf],
) -> Result<SendResult> {
    let mut ctl = controller(client, channel, None, Directory::in_memory());

    ctl.apply(Command::SetContent(content.to_string()));
    for reply in replies {
        let id = MessageId::new(reply.id.as_str());
        ctl.apply(Command::ReplyTo(id.clone()));
        if reply.mention {
            ctl.apply(Command::ToggleMention(id));
        }
    }
    for path in attachments {
        ctl.apply(Command::QueueAttachment(read_attachment(path)?));
    }

    if ctl.composer().is_empty() {
        anyhow::bail!("Nothing to send");
    }

    let mut messages = 0;
    while !ctl.composer().is_empty() {
        ctl.send_pending().await.context("Failed to send message")?;
        messages += 1;
    }

    Ok(SendResult {
        channel: channel.to_string(),
        messages,
        attachments: attachments.len(),
    })
}

/// Replace the content of a message.
pub async fn edit(client: &ChatClient, channel: &str, message: &str, content: &str) -> Result<()> {
    let mut ctl = controller(client, channel, None, Directory::in_memory());
    ctl.apply(Command::Edit(MessageId::new(message)));
    ctl.apply(Command::SetContent(content.to_string()));
    ctl.send_pending().await.context("Failed to edit message")
}

/// Mark a channel read up to a message.
pub async fn ack(client: &ChatClient, channel: &str, message: &str) -> Result<()> {
    client
        .channels()
        .acknowledge(&ChannelId::new(channel), &MessageId::new(message))
        .await
        .context("Failed to acknowledge")
}

/// Open a channel for watching.
pub async fn open(
    client: &ChatClient,
    channel: &str,
    server: Option<&str>,
    directory: Directory,
) -> Result<ConversationController> {
    let mut ctl = controller(client, channel, server, directory);
    ctl.load().await.context("Failed to load channel")?;
    Ok(ctl)
}
