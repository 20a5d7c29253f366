//! Channel API.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;

use crate::{
    client::ChatClientInner,
    error::{Error, Result},
    models::{ChannelId, MessageId},
    service::{HistoryPage, OutgoingMessage},
};

/// Default number of messages per history page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page the service accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// API for channel message operations.
pub struct ChannelApi {
    client: Arc<ChatClientInner>,
}

impl ChannelApi {
    pub(crate) fn new(client: Arc<ChatClientInner>) -> Self {
        Self { client }
    }

    /// Fetch message history.
    pub fn history(&self, channel: impl Into<ChannelId>) -> HistoryBuilder {
        HistoryBuilder {
            client: self.client.clone(),
            channel: channel.into(),
            limit: DEFAULT_PAGE_SIZE,
            before: None,
        }
    }

    /// Mark a channel as read up to a message.
    pub async fn acknowledge(&self, channel: &ChannelId, message: &MessageId) -> Result<()> {
        let path = format!("channels/{}/ack/{}", channel, message);
        self.client
            .authed_executor()?
            .send_json::<()>(Method::PUT, &path, None)
            .await
    }

    /// Send a message.
    pub async fn send(&self, channel: &ChannelId, message: &OutgoingMessage) -> Result<()> {
        if message.content.trim().is_empty() && message.attachments.is_empty() {
            return Err(Error::invalid("Message needs content or attachments"));
        }

        let path = format!("channels/{}/messages", channel);
        self.client
            .authed_executor()?
            .send_json(Method::POST, &path, Some(message))
            .await
    }

    /// Replace the content of a message.
    pub async fn edit(&self, channel: &ChannelId, message: &MessageId, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(Error::invalid("Edited content cannot be empty"));
        }

        #[derive(Serialize)]
        struct EditBody<'a> {
            content: &'a str,
        }

        let path = format!("channels/{}/messages/{}", channel, message);
        self.client
            .authed_executor()?
            .send_json(Method::PATCH, &path, Some(&EditBody { content }))
            .await
    }
}

/// Builder for history requests.
pub struct HistoryBuilder {
    client: Arc<ChatClientInner>,
    channel: ChannelId,
    limit: usize,
    before: Option<MessageId>,
}

impl HistoryBuilder {
    /// Set the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Only return messages older than this one.
    pub fn before(mut self, id: impl Into<MessageId>) -> Self {
        self.before = Some(id.into());
        self
    }

    /// Execute the request.
    pub async fn send(self) -> Result<HistoryPage> {
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(Error::invalid(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let limit = self.limit.to_string();
        let mut query = vec![("limit", limit.as_str()), ("include_users", "true")];
        if let Some(ref before) = self.before {
            query.push(("before", before.as_str()));
        }

        let path = format!("channels/{}/messages", self.channel);
        let page: HistoryPage = self
            .client
            .authed_executor()?
            .get_json(&path, &query)
            .await?;

        log::debug!(
            "Fetched {} messages from {} (before {:?})",
            page.messages.len(),
            self.channel,
            self.before
        );
        Ok(page)
    }
}
