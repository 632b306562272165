use crate::types::MessageEntry;
use std::collections::{HashMap, VecDeque};

/// Rendered in place of a transcript when a channel has never queued anything.
pub const UNKNOWN_CHANNEL_RENDER: &str = "[]";

/// Per-channel message buffers, oldest entry first.
///
/// Queues are created on the first accepted message for a channel and live
/// as long as the store.
#[derive(Debug, Default)]
pub struct QueueStore {
    queues: HashMap<String, VecDeque<MessageEntry>>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` unless its content contains any of `filters`.
    /// Returns whether the entry was queued.
    pub fn append(&mut self, channel: &str, entry: MessageEntry, filters: &[String]) -> bool {
        if contains_filter(&entry.content, filters) {
            return false;
        }
        self.queues
            .entry(channel.to_string())
            .or_default()
            .push_back(entry);
        true
    }

    pub fn size(&self, channel: &str) -> usize {
        self.queues.get(channel).map_or(0, VecDeque::len)
    }

    pub fn is_full(&self, channel: &str, threshold: usize) -> bool {
        match self.queues.get(channel) {
            Some(queue) => queue.len() >= threshold,
            None => false,
        }
    }

    /// Drops the oldest `keep_from` entries.
    pub fn drain(&mut self, channel: &str, keep_from: usize) {
        if let Some(queue) = self.queues.get_mut(channel) {
            let cut = keep_from.min(queue.len());
            queue.drain(..cut);
        }
    }

    pub fn render(&self, channel: &str) -> String {
        let queue = match self.queues.get(channel) {
            Some(queue) => queue,
            None => return UNKNOWN_CHANNEL_RENDER.to_string(),
        };
        queue
            .iter()
            .map(MessageEntry::transcript_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn contains_filter(content: &str, filters: &[String]) -> bool {
    filters.iter().any(|f| content.contains(f.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, content: &str) -> MessageEntry {
        MessageEntry {
            id,
            sender: format!("user{id}"),
            sender_id: format!("u{id}"),
            content: content.to_string(),
        }
    }

    #[test]
    fn unknown_channel_is_empty_and_never_full() {
        let store = QueueStore::new();
        assert_eq!(store.size("nope"), 0);
        assert!(!store.is_full("nope", 1));
        assert!(!store.is_full("nope", 10));
        assert_eq!(store.render("nope"), "[]");
    }

    #[test]
    fn appends_keep_insertion_order() {
        let mut store = QueueStore::new();
        for id in 1..=3 {
            assert!(store.append("g1", entry(id, &format!("msg {id}")), &[]));
        }
        assert_eq!(store.size("g1"), 3);
        assert_eq!(
            store.render("g1"),
            "[1] user1<u1> 说: msg 1\n[2] user2<u2> 说: msg 2\n[3] user3<u3> 说: msg 3"
        );
    }

    #[test]
    fn filtered_content_is_dropped_silently() {
        let mut store = QueueStore::new();
        let filters = vec!["g1".to_string()];

        assert!(!store.append("g1", entry(1, "talking about g1 here"), &filters));
        assert_eq!(store.size("g1"), 0);
        assert_eq!(store.render("g1"), "[]");

        assert!(store.append("g1", entry(2, "fine"), &filters));
        let before = store.render("g1");
        assert!(!store.append("g1", entry(3, "xg1x"), &filters));
        assert_eq!(store.size("g1"), 1);
        assert_eq!(store.render("g1"), before);
    }

    #[test]
    fn is_full_at_threshold() {
        let mut store = QueueStore::new();
        store.append("g1", entry(1, "a"), &[]);
        assert!(!store.is_full("g1", 2));
        store.append("g1", entry(2, "b"), &[]);
        assert!(store.is_full("g1", 2));
        store.append("g1", entry(3, "c"), &[]);
        assert!(store.is_full("g1", 2));
    }

    #[test]
    fn drain_keeps_suffix() {
        let mut store = QueueStore::new();
        for id in 1..=5 {
            store.append("g1", entry(id, "x"), &[]);
        }
        store.drain("g1", 2);
        assert_eq!(store.size("g1"), 3);
        let ids: Vec<u64> = store.queues["g1"].iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn drain_past_end_leaves_existing_empty_queue() {
        let mut store = QueueStore::new();
        store.append("g1", entry(1, "a"), &[]);
        store.append("g1", entry(2, "b"), &[]);
        store.drain("g1", 7);
        assert_eq!(store.size("g1"), 0);
        assert!(!store.is_full("g1", 1));
        assert_eq!(store.render("g1"), "");
    }

    #[test]
    fn drain_unknown_channel_is_noop() {
        let mut store = QueueStore::new();
        store.drain("ghost", 3);
        assert_eq!(store.render("ghost"), "[]");
    }
}
