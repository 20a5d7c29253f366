//! Client-side state of one open conversation.

mod ack;
mod composer;
mod controller;
mod grouping;
mod store;
mod typing;

pub use ack::{AckDebouncer, ACK_DELAY};
pub use composer::{
    Composer, ComposerState, PendingAttachment, MAX_ATTACHMENTS_PER_MESSAGE,
    MAX_REPLIES_PER_MESSAGE,
};
pub use controller::{
    Command, ControllerConfig, ConversationController, ConversationSnapshot, OlderRequest,
    SendJob, SendOutcome, PAGE_SIZE,
};
pub use grouping::{continues_group, regroup, GROUP_WINDOW_MS};
pub use store::MessageStore;
pub use typing::TypingSet;
