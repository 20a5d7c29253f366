//! In-memory chat service for unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    models::{AttachmentId, ChannelId, Member, MemberId, MessageId, ServerId, User, UserId},
    service::{ChatService, HistoryPage, OutgoingMessage},
};

#[derive(Default)]
struct State {
    pages: VecDeque<std::result::Result<HistoryPage, String>>,
    history_calls: Vec<(ChannelId, usize, Option<MessageId>)>,
    acks: Vec<(ChannelId, MessageId)>,
    fail_acks: bool,
    uploads: Vec<String>,
    fail_upload: Option<String>,
    sent: Vec<(ChannelId, OutgoingMessage)>,
    fail_send: bool,
    edits: Vec<(ChannelId, MessageId, String)>,
    users: HashMap<UserId, User>,
    user_fetches: Vec<UserId>,
    member_fetches: Vec<(ServerId, UserId)>,
    latency: Option<Duration>,
}

/// Scripted [`ChatService`] that records every call.
#[derive(Default)]
pub struct MockService {
    state: Mutex<State>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Queue the result of the next history fetch.
    pub fn push_page(&self, page: HistoryPage) {
        self.state().pages.push_back(Ok(page));
    }

    /// Queue a failing history fetch.
    pub fn push_failure(&self, message: &str) {
        self.state().pages.push_back(Err(message.to_owned()));
    }

    pub fn add_user(&self, user: User) {
        self.state().users.insert(user.id.clone(), user);
    }

    pub fn fail_acks(&self) {
        self.state().fail_acks = true;
    }

    pub fn fail_upload_of(&self, filename: &str) {
        self.state().fail_upload = Some(filename.to_owned());
    }

    /// Delay every upload and send by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    async fn wait(&self) {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    pub fn fail_sends(&self) {
        self.state().fail_send = true;
    }

    pub fn history_calls(&self) -> Vec<(ChannelId, usize, Option<MessageId>)> {
        self.state().history_calls.clone()
    }

    pub fn acks(&self) -> Vec<(ChannelId, MessageId)> {
        self.state().acks.clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state().uploads.clone()
    }

    pub fn sent(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.state().sent.clone()
    }

    pub fn edits(&self) -> Vec<(ChannelId, MessageId, String)> {
        self.state().edits.clone()
    }

    pub fn user_fetches(&self) -> Vec<UserId> {
        self.state().user_fetches.clone()
    }

    pub fn member_fetches(&self) -> Vec<(ServerId, UserId)> {
        self.state().member_fetches.clone()
    }
}

#[async_trait]
impl ChatService for MockService {
    async fn fetch_history(
        &self,
        channel: &ChannelId,
        limit: usize,
        before: Option<&MessageId>,
    ) -> Result<HistoryPage> {
        let mut state = self.state();
        state
            .history_calls
            .push((channel.clone(), limit, before.cloned()));
        match state.pages.pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(Error::api(500, message)),
            None => Ok(HistoryPage::default()),
        }
    }

    async fn acknowledge(&self, channel: &ChannelId, message: &MessageId) -> Result<()> {
        let mut state = self.state();
        state.acks.push((channel.clone(), message.clone()));
        if state.fail_acks {
            return Err(Error::api(500, "ack failed"));
        }
        Ok(())
    }

    async fn upload_attachment(
        &self,
        _bytes: Vec<u8>,
        filename: &str,
        _content_type: &str,
    ) -> Result<AttachmentId> {
        self.wait().await;
        let mut state = self.state();
        if state.fail_upload.as_deref() == Some(filename) {
            return Err(Error::api(413, "FileTooLarge"));
        }
        state.uploads.push(filename.to_owned());
        Ok(AttachmentId::new(format!("file-{}", filename)))
    }

    async fn send_message(&self, channel: &ChannelId, message: &OutgoingMessage) -> Result<()> {
        self.wait().await;
        let mut state = self.state();
        if state.fail_send {
            return Err(Error::api(500, "send failed"));
        }
        state.sent.push((channel.clone(), message.clone()));
        Ok(())
    }

    async fn edit_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        content: &str,
    ) -> Result<()> {
        self.state()
            .edits
            .push((channel.clone(), message.clone(), content.to_owned()));
        Ok(())
    }

    async fn fetch_user(&self, id: &UserId) -> Result<User> {
        let mut state = self.state();
        state.user_fetches.push(id.clone());
        state
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| Error::api(404, "NotFound"))
    }

    async fn fetch_member(&self, server: &ServerId, user: &UserId) -> Result<Member> {
        self.state()
            .member_fetches
            .push((server.clone(), user.clone()));
        Ok(Member {
            id: MemberId {
                server: server.clone(),
                user: user.clone(),
            },
            ..Default::default()
        })
    }
}
