//! Ordered, deduplicated message list for one conversation.

use std::collections::HashSet;

use crate::models::{Message, MessageId};

use super::grouping::regroup;

/// Messages of the open conversation, newest first.
///
/// IDs are unique. Every mutation regroups the list before returning, so
/// `tail` flags are always current.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a freshly fetched page.
    pub fn seed(&mut self, messages: Vec<Message>) {
        self.messages.clear();
        self.ids.clear();
        self.extend_unique(messages);
        regroup(&mut self.messages);
    }

    /// Append an older page. Messages already present are skipped.
    ///
    /// Returns the number of messages added.
    pub fn merge(&mut self, older: Vec<Message>) -> usize {
        let added = self.extend_unique(older);
        if added > 0 {
            regroup(&mut self.messages);
        }
        added
    }

    /// Insert at the front, or replace in place if the ID is already present.
    ///
    /// Returns `true` if the message was new.
    pub fn upsert(&mut self, message: Message) -> bool {
        let inserted = match self.position(&message.id) {
            Some(idx) => {
                self.messages[idx] = message;
                false
            }
            None => {
                self.ids.insert(message.id.clone());
                self.messages.insert(0, message);
                true
            }
        };
        regroup(&mut self.messages);
        inserted
    }

    /// Modify a message in place. Returns `false` if it is not present.
    pub fn update<F>(&mut self, id: &MessageId, f: F) -> bool
    where
        F: FnOnce(&mut Message),
    {
        let Some(idx) = self.position(id) else {
            return false;
        };
        f(&mut self.messages[idx]);
        regroup(&mut self.messages);
        true
    }

    /// Remove a message. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &MessageId) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.messages.retain(|m| &m.id != id);
        regroup(&mut self.messages);
        true
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        if !self.contains(id) {
            return None;
        }
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    /// ID of the oldest loaded message, the pagination cursor.
    pub fn oldest_id(&self) -> Option<&MessageId> {
        self.messages.last().map(|m| &m.id)
    }

    pub fn newest_id(&self) -> Option<&MessageId> {
        self.messages.first().map(|m| &m.id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Current messages, newest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        if !self.ids.contains(id) {
            return None;
        }
        self.messages.iter().position(|m| &m.id == id)
    }

    fn extend_unique(&mut self, messages: Vec<Message>) -> usize {
        let mut added = 0;
        for message in messages {
            if self.ids.insert(message.id.clone()) {
                self.messages.push(message);
                added += 1;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ulid_time_prefix;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn msg(id: &str) -> Message {
        Message {
            id: id.into(),
            channel: "C1".into(),
            author: "U1".into(),
            ..Default::default()
        }
    }

    fn ids(store: &MessageStore) -> Vec<&str> {
        store.messages().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_seed_replaces_and_dedupes() {
        let mut store = MessageStore::new();
        store.upsert(msg("X"));
        store.seed(vec![msg("C"), msg("B"), msg("C"), msg("A")]);
        assert_eq!(ids(&store), vec!["C", "B", "A"]);
        assert!(!store.contains(&"X".into()));
    }

    #[test]
    fn test_merge_appends_missing_in_order() {
        let mut store = MessageStore::new();
        store.seed(vec![msg("D"), msg("C")]);
        let added = store.merge(vec![msg("C"), msg("B"), msg("A")]);
        assert_eq!(added, 2);
        assert_eq!(ids(&store), vec!["D", "C", "B", "A"]);
        assert_eq!(store.oldest_id(), Some(&MessageId::new("A")));
    }

    #[test]
    fn test_upsert_prepends_new() {
        let mut store = MessageStore::new();
        store.seed(vec![msg("B"), msg("A")]);
        assert!(store.upsert(msg("C")));
        assert_eq!(ids(&store), vec!["C", "B", "A"]);
        assert_eq!(store.newest_id(), Some(&MessageId::new("C")));
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = MessageStore::new();
        store.seed(vec![msg("C"), msg("B"), msg("A")]);

        let mut edited = msg("B");
        edited.content = Some("edited".into());
        assert!(!store.upsert(edited));

        assert_eq!(ids(&store), vec!["C", "B", "A"]);
        assert_eq!(
            store.get(&"B".into()).unwrap().content.as_deref(),
            Some("edited")
        );
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = MessageStore::new();
        store.seed(vec![msg("B"), msg("A")]);
        assert!(!store.remove(&"Z".into()));
        assert_eq!(ids(&store), vec!["B", "A"]);

        assert!(store.remove(&"B".into()));
        assert_eq!(ids(&store), vec!["A"]);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = MessageStore::new();
        store.seed(vec![msg("A")]);
        assert!(!store.update(&"Z".into(), |m| m.content = Some("x".into())));
        assert!(store.update(&"A".into(), |m| m.content = Some("x".into())));
        assert_eq!(store.get(&"A".into()).unwrap().content.as_deref(), Some("x"));
    }

    #[test]
    fn test_mutations_regroup() {
        let base = 1_700_000_000_000u64;
        let id = |offset: u64, s: &str| format!("{}{:0>16}", ulid_time_prefix(base + offset), s);

        let mut store = MessageStore::new();
        store.seed(vec![msg(&id(0, "A"))]);
        assert!(!store.messages()[0].tail);

        store.upsert(msg(&id(65_000, "B")));
        assert_eq!(
            store.messages().iter().map(|m| m.tail).collect::<Vec<_>>(),
            vec![true, false]
        );

        store.remove(&id(0, "A").into());
        assert!(!store.messages()[0].tail);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Upsert(u8),
        Remove(u8),
        Merge(Vec<u8>),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..16).prop_map(Op::Upsert),
            (0u8..16).prop_map(Op::Remove),
            prop::collection::vec(0u8..16, 0..6).prop_map(Op::Merge),
        ]
    }

    proptest! {
        #[test]
        fn prop_ids_stay_unique(ops in prop::collection::vec(op(), 0..64)) {
            let mut store = MessageStore::new();
            for op in ops {
                match op {
                    Op::Upsert(n) => { store.upsert(msg(&format!("M{n}"))); }
                    Op::Remove(n) => { store.remove(&format!("M{n}").into()); }
                    Op::Merge(ns) => {
                        store.merge(ns.iter().map(|n| msg(&format!("M{n}"))).collect());
                    }
                }

                let unique: HashSet<_> = store.messages().iter().map(|m| &m.id).collect();
                prop_assert_eq!(unique.len(), store.len());
                prop_assert_eq!(store.ids.len(), store.len());
            }
        }
    }
}
