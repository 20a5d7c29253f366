//! API modules.

mod channel;
mod file;
mod user;

pub use channel::{ChannelApi, HistoryBuilder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use file::{FileApi, ATTACHMENTS_TAG};
pub use user::UserApi;
