//! The open conversation: folds realtime frames, user commands and network
//! completions into one state and publishes snapshots of it.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::{
    cache::Directory,
    error::{Error, Result},
    models::{ChannelId, Message, MessageId, ServerId, UserId},
    realtime::{RealtimeFrame, Subscription},
    service::{ChatService, HistoryPage, OutgoingMessage},
};

use super::{
    ack::{AckDebouncer, ACK_DELAY},
    composer::{Composer, ComposerState, PendingAttachment},
    store::MessageStore,
    typing::TypingSet,
};

/// Messages requested per history page.
pub const PAGE_SIZE: usize = 50;

/// Tunables of a [`ConversationController`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub page_size: usize,
    pub ack_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            ack_delay: ACK_DELAY,
        }
    }
}

/// Renderable state of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationSnapshot {
    pub channel: ChannelId,
    /// Newest first, with grouping applied.
    pub messages: Vec<Message>,
    pub typing: Vec<UserId>,
    /// No older history remains.
    pub exhausted: bool,
    pub loading_older: bool,
    pub sending: bool,
    pub composer: ComposerState,
    /// The last failed operation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// User intents handled by [`ConversationController::run`].
#[derive(Debug, Clone)]
pub enum Command {
    ReplyTo(MessageId),
    ToggleMention(MessageId),
    RemoveReply(MessageId),
    Edit(MessageId),
    CancelEdit,
    SetContent(String),
    SetSelection(usize, usize),
    Insert(String),
    QueueAttachment(PendingAttachment),
    RemoveAttachment(usize),
    FetchOlder,
    Send,
    Dispose,
}

/// A history request detached from the controller so it can run elsewhere.
#[derive(Debug, Clone)]
pub struct OlderRequest {
    channel: ChannelId,
    limit: usize,
    before: Option<MessageId>,
}

impl OlderRequest {
    pub async fn execute(&self, service: &dyn ChatService) -> Result<HistoryPage> {
        service
            .fetch_history(&self.channel, self.limit, self.before.as_ref())
            .await
    }
}

/// An outbound operation detached from the controller.
#[derive(Debug, Clone)]
pub enum SendJob {
    Edit {
        channel: ChannelId,
        message: MessageId,
        content: String,
    },
    Send {
        channel: ChannelId,
        message: OutgoingMessage,
        attachments: Vec<PendingAttachment>,
    },
}

/// What a completed [`SendJob`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Edited,
    /// A message was sent with this many uploaded attachments.
    Sent { consumed: usize },
}

impl SendJob {
    /// Upload attachments in order, then send. The first failed upload
    /// aborts the whole job.
    ///
    /// `on_progress` receives the fraction of attachments uploaded so far.
    pub async fn execute<F>(self, service: &dyn ChatService, mut on_progress: F) -> Result<SendOutcome>
    where
        F: FnMut(f32) + Send,
    {
        match self {
            SendJob::Edit {
                channel,
                message,
                content,
            } => {
                service.edit_message(&channel, &message, &content).await?;
                Ok(SendOutcome::Edited)
            }
            SendJob::Send {
                channel,
                mut message,
                attachments,
            } => {
                let total = attachments.len();
                for (idx, attachment) in attachments.into_iter().enumerate() {
                    let id = service
                        .upload_attachment(
                            attachment.bytes,
                            &attachment.filename,
                            &attachment.content_type,
                        )
                        .await
                        .map_err(|e| {
                            log::warn!("Upload of {} failed: {}", attachment.filename, e);
                            e
                        })?;
                    log::debug!("Uploaded {} as {}", attachment.filename, id);
                    message.attachments.push(id);
                    on_progress((idx + 1) as f32 / total as f32);
                }
                service.send_message(&channel, &message).await?;
                Ok(SendOutcome::Sent { consumed: total })
            }
        }
    }
}

enum Completion {
    Older(Result<HistoryPage>),
    Progress(f32),
    Sent(Result<SendOutcome>),
}

/// State and behavior of one open conversation.
///
/// All mutation goes through `&mut self`. Drive it directly or hand it to
/// [`run`](Self::run), which owns it for the lifetime of the view.
pub struct ConversationController {
    channel: ChannelId,
    server: Option<ServerId>,
    service: Arc<dyn ChatService>,
    directory: Directory,
    config: ControllerConfig,
    store: MessageStore,
    typing: TypingSet,
    composer: Composer,
    exhausted: bool,
    loading_older: bool,
    sending: bool,
    disposed: bool,
    last_error: Option<String>,
    acks: AckDebouncer,
    snapshots: watch::Sender<ConversationSnapshot>,
}

impl ConversationController {
    pub fn new(channel: ChannelId, service: Arc<dyn ChatService>, directory: Directory) -> Self {
        Self::with_config(channel, service, directory, ControllerConfig::default())
    }

    pub fn with_config(
        channel: ChannelId,
        service: Arc<dyn ChatService>,
        directory: Directory,
        config: ControllerConfig,
    ) -> Self {
        let (snapshots, _) = watch::channel(ConversationSnapshot {
            channel: channel.clone(),
            ..Default::default()
        });
        Self {
            channel,
            server: None,
            service,
            directory,
            acks: AckDebouncer::new(config.ack_delay),
            config,
            store: MessageStore::new(),
            typing: TypingSet::new(),
            composer: Composer::new(),
            exhausted: false,
            loading_older: false,
            sending: false,
            disposed: false,
            last_error: None,
            snapshots,
        }
    }

    /// Resolve members of this server for authors and typists.
    pub fn in_server(mut self, server: ServerId) -> Self {
        self.server = Some(server);
        self
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn typing(&self) -> &TypingSet {
        &self.typing
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_loading_older(&self) -> bool {
        self.loading_older
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Receive a snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            channel: self.channel.clone(),
            messages: self.store.messages().to_vec(),
            typing: self.typing.users().to_vec(),
            exhausted: self.exhausted,
            loading_older: self.loading_older,
            sending: self.sending,
            composer: self.composer.state(),
            last_error: self.last_error.clone(),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn fail(&mut self, e: &Error) {
        self.last_error = Some(e.to_string());
        self.publish();
    }

    /// Load the newest page, replacing whatever is in the store.
    ///
    /// On failure the store is left as it was.
    pub async fn load(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        log::debug!("Loading {}", self.channel);

        let page = match self
            .service
            .fetch_history(&self.channel, self.config.page_size, None)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        if let Err(e) = self.directory.absorb_page(&page).await {
            log::warn!("Failed to cache history of {}: {}", self.channel, e);
        }
        self.exhausted = page.messages.len() < self.config.page_size;
        self.store.seed(page.messages);
        self.last_error = None;

        if let Some(newest) = self.store.newest_id().cloned() {
            self.mark_read(newest).await;
        }
        self.publish();
        Ok(())
    }

    /// Start a history request for the page before the oldest loaded message.
    ///
    /// Returns `None` when history is exhausted, a request is already in
    /// flight, or the controller is disposed.
    pub fn begin_fetch_older(&mut self) -> Option<OlderRequest> {
        if self.disposed || self.exhausted || self.loading_older {
            return None;
        }
        self.loading_older = true;
        self.publish();
        Some(OlderRequest {
            channel: self.channel.clone(),
            limit: self.config.page_size,
            before: self.store.oldest_id().cloned(),
        })
    }

    /// Fold the result of a history request. Returns the number of messages
    /// added.
    pub async fn finish_fetch_older(&mut self, result: Result<HistoryPage>) -> Result<usize> {
        self.loading_older = false;
        if self.disposed {
            return Ok(0);
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        if page.messages.len() < self.config.page_size {
            log::debug!("History of {} exhausted", self.channel);
            self.exhausted = true;
        }
        if let Err(e) = self.directory.absorb_page(&page).await {
            log::warn!("Failed to cache history of {}: {}", self.channel, e);
        }
        let added = self.store.merge(page.messages);
        self.last_error = None;
        self.publish();
        Ok(added)
    }

    /// Fetch the next older page and merge it.
    pub async fn fetch_older(&mut self) -> Result<usize> {
        let Some(request) = self.begin_fetch_older() else {
            return Ok(0);
        };
        let service = self.service.clone();
        let result = request.execute(service.as_ref()).await;
        self.finish_fetch_older(result).await
    }

    /// Apply a realtime frame. Returns `true` if the state changed.
    pub async fn handle_frame(&mut self, frame: RealtimeFrame) -> bool {
        if self.disposed {
            return false;
        }
        if let Some(channel) = frame.channel() {
            if channel != &self.channel {
                return false;
            }
        }
        log::trace!("Applying {} to {}", frame.kind(), self.channel);

        let changed = match frame {
            RealtimeFrame::Message(message) => self.on_message(message).await,
            RealtimeFrame::MessageUpdate { id, data, .. } => {
                if self.store.update(&id, |m| m.merge_partial(&data)) {
                    self.recache(&id).await;
                    true
                } else {
                    false
                }
            }
            RealtimeFrame::MessageAppend { id, append, .. } => {
                self.apply_to_cached(&id, |m| m.apply_append(&append)).await
            }
            RealtimeFrame::MessageReact {
                id,
                user_id,
                emoji_id,
                ..
            } => {
                self.apply_to_cached(&id, |m| {
                    m.add_reaction(&emoji_id, &user_id);
                })
                .await
            }
            RealtimeFrame::MessageUnreact {
                id,
                user_id,
                emoji_id,
                ..
            } => {
                self.apply_to_cached(&id, |m| {
                    m.remove_reaction(&emoji_id, &user_id);
                })
                .await
            }
            RealtimeFrame::MessageDelete { id, .. } => {
                self.directory.remove_message(&id).await;
                self.store.remove(&id)
            }
            RealtimeFrame::ChannelStartTyping { user, .. } => {
                if self.typing.contains(&user) {
                    false
                } else {
                    self.resolve_user(&user).await;
                    self.typing.start(user)
                }
            }
            RealtimeFrame::ChannelStopTyping { user, .. } => self.typing.stop(&user),
            RealtimeFrame::Reconnected => {
                log::debug!("Resynchronising {}", self.channel);
                self.typing.clear();
                true
            }
            RealtimeFrame::Unknown => false,
        };

        if changed {
            self.publish();
        }
        changed
    }

    async fn on_message(&mut self, message: Message) -> bool {
        self.resolve_user(&message.author).await;
        if let Err(e) = self.directory.put_message(&message).await {
            log::warn!("Failed to cache message {}: {}", message.id, e);
        }

        let id = message.id.clone();
        if !self.store.upsert(message) {
            log::debug!("Replaced redelivered message {}", id);
        }
        self.mark_read(id).await;
        true
    }

    /// Apply `f` to the cached copy of a loaded message, then show that copy.
    async fn apply_to_cached<F>(&mut self, id: &MessageId, f: F) -> bool
    where
        F: FnOnce(&mut Message) + Send,
    {
        if !self.store.contains(id) {
            return false;
        }
        let cached = match self.directory.message(id).await {
            Some(cached) => Some(cached),
            None => self.store.get(id).cloned(),
        };
        let Some(mut message) = cached else {
            return false;
        };

        f(&mut message);
        if let Err(e) = self.directory.put_message(&message).await {
            log::warn!("Failed to cache message {}: {}", id, e);
        }
        self.store.upsert(message);
        true
    }

    async fn recache(&self, id: &MessageId) {
        if let Some(message) = self.store.get(id) {
            if let Err(e) = self.directory.put_message(message).await {
                log::warn!("Failed to cache message {}: {}", id, e);
            }
        }
    }

    async fn resolve_user(&self, user: &UserId) {
        let service = self.service.as_ref();
        if let Err(e) = self.directory.ensure_user(service, user).await {
            log::warn!("Failed to resolve user {}: {}", user, e);
        }
        if let Some(server) = &self.server {
            if let Err(e) = self.directory.ensure_member(service, server, user).await {
                log::warn!("Failed to resolve member {} of {}: {}", user, server, e);
            }
        }
    }

    /// Move the local read marker, then (re)start the acknowledgement timer
    /// for the newest message read so far.
    async fn mark_read(&mut self, message: MessageId) {
        let target = match self.directory.mark_read(&self.channel, &message).await {
            Ok(true) => message,
            Ok(false) => self
                .directory
                .read_marker(&self.channel)
                .await
                .unwrap_or(message),
            Err(e) => {
                log::warn!("Failed to store read marker for {}: {}", self.channel, e);
                message
            }
        };
        self.acks
            .schedule(self.service.clone(), self.channel.clone(), target);
    }

    /// Apply a composer command. Returns `true` if the state changed.
    ///
    /// `FetchOlder`, `Send` and `Dispose` involve more than the composer and
    /// are ignored here.
    pub fn apply(&mut self, command: Command) -> bool {
        if self.disposed {
            return false;
        }
        let changed = match command {
            Command::ReplyTo(id) => self.composer.add_reply(id),
            Command::ToggleMention(id) => self.composer.toggle_mention(&id),
            Command::RemoveReply(id) => self.composer.remove_reply(&id),
            Command::Edit(id) => {
                let content = self.store.get(&id).and_then(|m| m.content.clone());
                self.composer.begin_edit(id, content.as_deref());
                true
            }
            Command::CancelEdit => {
                self.composer.cancel_edit();
                true
            }
            Command::SetContent(content) => {
                self.composer.set_content(content);
                true
            }
            Command::SetSelection(start, end) => {
                self.composer.set_selection(start, end);
                true
            }
            Command::Insert(text) => {
                self.composer.insert_at_cursor(&text);
                true
            }
            Command::QueueAttachment(attachment) => {
                self.composer.queue_attachment(attachment);
                true
            }
            Command::RemoveAttachment(_) if self.sending => {
                log::debug!("Attachment queue of {} is locked while sending", self.channel);
                false
            }
            Command::RemoveAttachment(index) => self.composer.remove_attachment(index).is_some(),
            Command::FetchOlder | Command::Send | Command::Dispose => false,
        };
        if changed {
            self.publish();
        }
        changed
    }

    /// Take what the composer holds as an outbound job.
    ///
    /// Returns `Ok(None)` when a send is already in flight or the controller
    /// is disposed.
    pub fn begin_send(&mut self) -> Result<Option<SendJob>> {
        if self.disposed || self.sending {
            return Ok(None);
        }

        let job = match self.composer.editing() {
            Some(id) => {
                let content = self.composer.content().trim();
                if content.is_empty() {
                    return Err(Error::invalid("Edited message cannot be empty"));
                }
                SendJob::Edit {
                    channel: self.channel.clone(),
                    message: id.clone(),
                    content: content.to_owned(),
                }
            }
            None => {
                if self.composer.is_empty() {
                    return Err(Error::invalid("Nothing to send"));
                }
                SendJob::Send {
                    channel: self.channel.clone(),
                    message: self.composer.outgoing(),
                    attachments: self.composer.next_batch().to_vec(),
                }
            }
        };

        self.sending = true;
        self.composer.set_upload_progress(0.0);
        self.publish();
        Ok(Some(job))
    }

    /// Record upload progress of the running send.
    pub fn report_progress(&mut self, progress: f32) {
        if self.disposed || !self.sending {
            return;
        }
        self.composer.set_upload_progress(progress);
        self.publish();
    }

    /// Fold the result of a send. On failure the composed state is kept.
    pub fn finish_send(&mut self, result: Result<SendOutcome>) -> Result<()> {
        self.sending = false;
        if self.disposed {
            return Ok(());
        }

        match result {
            Ok(SendOutcome::Edited) => self.composer.cancel_edit(),
            Ok(SendOutcome::Sent { consumed }) => self.composer.finish_send(consumed),
            Err(e) => {
                self.composer.set_upload_progress(0.0);
                self.fail(&e);
                return Err(e);
            }
        }
        self.last_error = None;
        self.publish();
        Ok(())
    }

    /// Send or edit with the current composer contents.
    pub async fn send_pending(&mut self) -> Result<()> {
        let job = match self.begin_send() {
            Ok(Some(job)) => job,
            Ok(None) => return Ok(()),
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };
        let service = self.service.clone();
        let snapshots = &self.snapshots;
        let composer = &mut self.composer;
        let result = job
            .execute(service.as_ref(), |p| {
                composer.set_upload_progress(p);
                let progress = composer.upload_progress();
                snapshots.send_modify(|s| s.composer.upload_progress = progress);
            })
            .await;
        self.finish_send(result)
    }

    /// Stop reacting to anything. Pending acknowledgement is cancelled and
    /// late completions are discarded.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        log::debug!("Closing {}", self.channel);
        self.disposed = true;
        self.acks.cancel();
    }

    /// Dispose, then drop this conversation's messages from the directory.
    pub async fn close(&mut self) {
        self.dispose();
        let ids: Vec<&MessageId> = self.store.messages().iter().map(|m| &m.id).collect();
        self.directory.forget_messages(ids).await;
    }

    /// Drive the conversation until a `Dispose` command arrives or the
    /// command channel closes, then [`close`](Self::close) it.
    ///
    /// History requests and sends run on spawned tasks and are folded back
    /// in here, so the loop keeps applying frames while they are in flight.
    pub async fn run(
        mut self,
        mut realtime: Subscription,
        mut commands: mpsc::Receiver<Command>,
    ) -> Self {
        let mut realtime_open = true;
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        self.publish();
        loop {
            tokio::select! {
                frame = realtime.recv(), if realtime_open => match frame {
                    Some(frame) => {
                        self.handle_frame(frame).await;
                    }
                    None => {
                        log::debug!("Realtime hub closed");
                        realtime_open = false;
                    }
                },
                command = commands.recv() => match command {
                    None | Some(Command::Dispose) => break,
                    Some(Command::FetchOlder) => {
                        if let Some(request) = self.begin_fetch_older() {
                            let service = self.service.clone();
                            let tx = done_tx.clone();
                            tokio::spawn(async move {
                                let result = request.execute(service.as_ref()).await;
                                let _ = tx.send(Completion::Older(result));
                            });
                        }
                    }
                    Some(Command::Send) => match self.begin_send() {
                        Ok(Some(job)) => {
                            let service = self.service.clone();
                            let tx = done_tx.clone();
                            tokio::spawn(async move {
                                let progress = tx.clone();
                                let result = job
                                    .execute(service.as_ref(), move |p| {
                                        let _ = progress.send(Completion::Progress(p));
                                    })
                                    .await;
                                let _ = tx.send(Completion::Sent(result));
                            });
                        }
                        Ok(None) => {}
                        Err(e) => {
                            log::debug!("Send rejected: {}", e);
                            self.fail(&e);
                        }
                    },
                    Some(command) => {
                        self.apply(command);
                    }
                },
                Some(done) = done_rx.recv() => match done {
                    Completion::Older(result) => {
                        if let Err(e) = self.finish_fetch_older(result).await {
                            log::warn!("Failed to load older history of {}: {}", self.channel, e);
                        }
                    }
                    Completion::Progress(p) => self.report_progress(p),
                    Completion::Sent(result) => {
                        if let Err(e) = self.finish_send(result) {
                            log::warn!("Failed to send to {}: {}", self.channel, e);
                        }
                    }
                },
            }
        }

        self.close().await;
        self
    }
}
