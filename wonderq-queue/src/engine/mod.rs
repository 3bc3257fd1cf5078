//! Visibility-timeout queue engine
//!
//! The engine owns three pieces of state behind a single lock:
//! - the message store, an ordered sequence of messages awaiting delivery
//! - the pending set, messages handed to a consumer but not yet acknowledged
//! - the redelivery scheduler, one timer per `dequeue` call
//!
//! Every operation, including a timer firing, runs with the lock held for its
//! whole duration, so a message id is never in both the store and the pending
//! set and an acknowledgment racing a timer is settled by whichever takes the
//! lock first.

mod pending;
mod scheduler;
mod store;


use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use wonderq_core::MessageId;

use crate::error::QueueError;
use crate::message::{Message, Payload};
use pending::PendingSet;
use scheduler::{BatchId, RedeliveryScheduler};
use store::MessageStore;

/// Default time a dequeued message stays invisible before redelivery
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub visibility_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }
}

/// Result of a well-formed acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The message was pending and is now permanently removed
    Acknowledged,
    /// The message was not pending, usually because its visibility timeout
    /// expired and it went back to the queue
    Stale,
}

#[derive(Debug)]
struct QueueState {
    store: MessageStore,
    pending: PendingSet,
    scheduler: RedeliveryScheduler,
}

impl QueueState {
    /// Move the still-pending members of `batch` back to the front of the store.
    fn redeliver(&mut self, batch: BatchId) -> usize {
        let Some(members) = self.scheduler.take_fired(batch) else {
            return 0;
        };

        let survivors: Vec<Message> = members
            .iter()
            .filter_map(|id| self.pending.remove_from_batch(id.as_str(), batch))
            .map(|entry| entry.message)
            .collect();

        for message in &survivors {
            debug!(message_id = %message.message_id, "Message reinserted after timeout");
        }

        let count = survivors.len();
        self.store.prepend_batch(survivors);
        count
    }
}

/// In-memory queue with at-least-once delivery
///
/// Share it behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct QueueEngine {
    state: Arc<Mutex<QueueState>>,
}

impl QueueEngine {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                store: MessageStore::default(),
                pending: PendingSet::default(),
                scheduler: RedeliveryScheduler::new(config.visibility_timeout),
            })),
        }
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.state.lock().scheduler.timeout()
    }

    /// Append a message to the back of the queue and return its id.
    pub fn enqueue(&self, payload: Option<Payload>) -> Result<MessageId, QueueError> {
        let payload = payload
            .filter(|p| !p.is_empty())
            .ok_or(QueueError::EmptyPayload)?;

        let message = Message::new(payload);
        let message_id = message.message_id.clone();

        let mut state = self.state.lock();
        state.store.push_back(message);

        info!(message_id = %message_id, queued = state.store.len(), "Enqueued message");
        Ok(message_id)
    }

    /// Check out up to `amount` messages from the front of the queue.
    ///
    /// The returned messages stay pending until acknowledged or until the
    /// visibility timeout expires, whichever comes first. The redelivery timer
    /// runs on the current Tokio runtime; without one the call fails with
    /// [`QueueError::NoRuntime`] and the queue is left untouched.
    pub fn dequeue(&self, amount: Option<usize>) -> Result<Vec<Message>, QueueError> {
        let amount = amount.ok_or(QueueError::MissingAmount)?;
        let runtime = Handle::try_current().map_err(|_| QueueError::NoRuntime)?;

        let mut state = self.state.lock();
        let batch = state.store.take_front(amount);
        if batch.is_empty() {
            return Ok(batch);
        }

        let members = batch.iter().map(|m| m.message_id.clone()).collect();
        let shared = Arc::downgrade(&self.state);
        let (batch_id, deadline) = state
            .scheduler
            .arm(&runtime, members, move |batch_id| fire(&shared, batch_id));

        for message in &batch {
            state
                .pending
                .mark_pending(message.clone(), batch_id, deadline);
        }

        info!(
            requested = amount,
            count = batch.len(),
            batch = ?batch_id,
            "Dequeued messages"
        );
        Ok(batch)
    }

    /// Permanently remove a pending message.
    pub fn acknowledge(&self, message_id: Option<&str>) -> Result<AckOutcome, QueueError> {
        let message_id = message_id
            .filter(|id| !id.is_empty())
            .ok_or(QueueError::MissingMessageId)?;

        let mut state = self.state.lock();
        let Some(entry) = state.pending.remove(message_id) else {
            warn!(message_id = %message_id, "Acknowledgment for a message that is not pending");
            return Ok(AckOutcome::Stale);
        };

        let disarmed = state.scheduler.release(entry.batch);
        info!(message_id = %message_id, disarmed, "Acknowledged message");
        Ok(AckOutcome::Acknowledged)
    }

    /// Drop every queued and pending message and cancel all timers.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.scheduler.cancel_all();
        state.store.clear();
        state.pending.clear();
        info!("Queue reset");
    }

    /// Number of messages waiting for delivery
    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().store.len() == 0
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Snapshot of the messages waiting for delivery, front first
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().store.iter().cloned().collect()
    }

    pub fn is_pending(&self, message_id: &str) -> bool {
        self.state.lock().pending.contains(message_id)
    }

    pub fn is_queued(&self, message_id: &str) -> bool {
        self.state.lock().store.contains(message_id)
    }

    /// Time left before a pending message is redelivered
    pub fn time_until_redelivery(&self, message_id: &str) -> Option<Duration> {
        self.state
            .lock()
            .pending
            .deadline(message_id)
            .map(|deadline| deadline.saturating_duration_since(tokio::time::Instant::now()))
    }

    /// Number of redelivery timers currently armed
    pub fn armed_timers(&self) -> usize {
        self.state.lock().scheduler.armed()
    }
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl Drop for QueueEngine {
    fn drop(&mut self) {
        self.state.lock().scheduler.cancel_all();
    }
}

fn fire(shared: &Weak<Mutex<QueueState>>, batch: BatchId) {
    let Some(state) = shared.upgrade() else {
        return;
    };

    let count = state.lock().redeliver(batch);
    if count > 0 {
        info!(count, batch = ?batch, "Redelivered messages after visibility timeout");
    }
}
