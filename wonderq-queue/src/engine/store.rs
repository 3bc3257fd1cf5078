//! Ordered store of messages awaiting delivery

use std::collections::VecDeque;

use crate::message::Message;

#[derive(Debug, Default)]
pub(crate) struct MessageStore {
    messages: VecDeque<Message>,
}

impl MessageStore {
    pub fn push_back(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    /// Remove up to `amount` messages from the front, in order.
    pub fn take_front(&mut self, amount: usize) -> Vec<Message> {
        let count = amount.min(self.messages.len());
        self.messages.drain(..count).collect()
    }

    /// Put a batch back ahead of everything currently queued, keeping its order.
    pub fn prepend_batch(&mut self, batch: Vec<Message>) {
        if batch.is_empty() {
            return;
        }

        let mut front = VecDeque::from(batch);
        front.append(&mut self.messages);
        self.messages = front;
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.messages
            .iter()
            .any(|m| m.message_id.as_str() == message_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
