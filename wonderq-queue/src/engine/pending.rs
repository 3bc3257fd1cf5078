//! Messages checked out by a consumer and not yet acknowledged

use std::collections::HashMap;

use tokio::time::Instant;
use wonderq_core::MessageId;

use super::scheduler::BatchId;
use crate::message::Message;

#[derive(Debug)]
pub(crate) struct PendingEntry {
    pub message: Message,
    pub batch: BatchId,
    pub deadline: Instant,
}

#[derive(Debug, Default)]
pub(crate) struct PendingSet {
    entries: HashMap<MessageId, PendingEntry>,
}

impl PendingSet {
    pub fn mark_pending(&mut self, message: Message, batch: BatchId, deadline: Instant) {
        self.entries.insert(
            message.message_id.clone(),
            PendingEntry {
                message,
                batch,
                deadline,
            },
        );
    }

    pub fn remove(&mut self, message_id: &str) -> Option<PendingEntry> {
        self.entries.remove(message_id)
    }

    /// Remove an entry only if it was checked out as part of `batch`.
    pub fn remove_from_batch(&mut self, message_id: &str, batch: BatchId) -> Option<PendingEntry> {
        match self.entries.get(message_id) {
            Some(entry) if entry.batch == batch => self.entries.remove(message_id),
            _ => None,
        }
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.entries.contains_key(message_id)
    }

    pub fn deadline(&self, message_id: &str) -> Option<Instant> {
        self.entries.get(message_id).map(|e| e.deadline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn message() -> Message {
        let mut payload = Map::new();
        payload.insert("k".to_string(), json!("v"));
        Message::new(payload)
    }

    #[test]
    fn test_mark_and_remove() {
        let mut pending = PendingSet::default();
        let m = message();
        let id = m.message_id.clone();
        let deadline = Instant::now();

        pending.mark_pending(m, BatchId::new(1), deadline);
        assert!(pending.contains(id.as_str()));
        assert_eq!(pending.deadline(id.as_str()), Some(deadline));

        let entry = pending.remove(id.as_str()).unwrap();
        assert_eq!(entry.message.message_id, id);
        assert!(pending.remove(id.as_str()).is_none());
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn test_remove_from_other_batch_is_ignored() {
        let mut pending = PendingSet::default();
        let m = message();
        let id = m.message_id.clone();

        pending.mark_pending(m, BatchId::new(2), Instant::now());

        assert!(pending.remove_from_batch(id.as_str(), BatchId::new(1)).is_none());
        assert!(pending.contains(id.as_str()));
        assert!(pending.remove_from_batch(id.as_str(), BatchId::new(2)).is_some());
    }
}
