//! Redelivery timers
//!
//! One timer is armed per `dequeue` call and shared by every message in that
//! batch. When it fires, the batch members that are still pending go back to
//! the front of the queue together, in their original order; members that
//! were acknowledged in the meantime are skipped. This couples the redelivery
//! instant of messages checked out together, in exchange for a single timer
//! per call instead of one per message.

use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use wonderq_core::MessageId;

/// Identifies the messages checked out by a single `dequeue` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BatchId(u64);

#[cfg(test)]
impl BatchId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug)]
struct ArmedBatch {
    members: Vec<MessageId>,
    outstanding: usize,
    timer: AbortHandle,
}

#[derive(Debug)]
pub(crate) struct RedeliveryScheduler {
    timeout: Duration,
    batches: HashMap<BatchId, ArmedBatch>,
    next_id: u64,
}

impl RedeliveryScheduler {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            batches: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arm a timer for `members` on `runtime`, calling `fire` with the batch
    /// id once the visibility timeout has elapsed.
    pub fn arm<F>(
        &mut self,
        runtime: &Handle,
        members: Vec<MessageId>,
        fire: F,
    ) -> (BatchId, Instant)
    where
        F: FnOnce(BatchId) + Send + 'static,
    {
        self.next_id += 1;
        let batch = BatchId(self.next_id);
        let deadline = Instant::now() + self.timeout;

        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            fire(batch);
        });

        self.batches.insert(
            batch,
            ArmedBatch {
                outstanding: members.len(),
                members,
                timer: task.abort_handle(),
            },
        );

        (batch, deadline)
    }

    /// Claim a batch at fire time. Returns `None` if the batch was already
    /// disarmed by acknowledgment or reset.
    pub fn take_fired(&mut self, batch: BatchId) -> Option<Vec<MessageId>> {
        self.batches.remove(&batch).map(|b| b.members)
    }

    /// Record that one member of `batch` left the pending set through
    /// acknowledgment. Once no member is left, the timer is cancelled.
    ///
    /// Returns true if the timer was cancelled.
    pub fn release(&mut self, batch: BatchId) -> bool {
        let Some(armed) = self.batches.get_mut(&batch) else {
            return false;
        };

        armed.outstanding = armed.outstanding.saturating_sub(1);
        if armed.outstanding > 0 {
            return false;
        }

        if let Some(armed) = self.batches.remove(&batch) {
            armed.timer.abort();
        }
        true
    }

    pub fn cancel_all(&mut self) {
        for (_, armed) in self.batches.drain() {
            armed.timer.abort();
        }
    }

    pub fn armed(&self) -> usize {
        self.batches.len()
    }
}
