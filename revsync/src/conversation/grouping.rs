//! Visual grouping of consecutive messages.
//!
//! Messages are laid out newest first. A message is a *tail* when it
//! continues the group of the message right after it in that order, which
//! is the one sent just before it. Tails are drawn without an author header.

use crate::models::Message;

/// Two messages further apart than this never share a group.
pub const GROUP_WINDOW_MS: i64 = 7 * 60 * 1000;

/// Whether `message` continues the group of `previous`, the message sent
/// immediately before it.
pub fn continues_group(message: &Message, previous: &Message) -> bool {
    if message.author != previous.author || message.masquerade != previous.masquerade {
        return false;
    }
    if message.is_system() || previous.is_system() {
        return false;
    }
    if message.has_replies() || previous.has_replies() {
        return false;
    }

    // Elapsed time comes from the IDs, not arrival order.
    match (message.id.timestamp_ms(), previous.id.timestamp_ms()) {
        (Some(a), Some(b)) => (a - b).abs() < GROUP_WINDOW_MS,
        _ => false,
    }
}

/// Recompute `tail` for a newest-first sequence.
pub fn regroup(messages: &mut [Message]) {
    let len = messages.len();
    for i in 0..len {
        let tail = match messages.get(i + 1) {
            Some(previous) => continues_group(&messages[i], previous),
            None => false,
        };
        messages[i].tail = tail;
    }
}
