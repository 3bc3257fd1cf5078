//! Queue engine for WonderQ
//!
//! Provides an in-memory message queue with at-least-once delivery:
//! - enqueue, dequeue and acknowledge messages
//! - automatic redelivery of messages left unacknowledged past the
//!   visibility timeout
//! - HTTP handlers exposing the three operations as JSON endpoints

mod engine;
mod error;
pub mod handlers;
mod message;

pub use engine::{AckOutcome, QueueConfig, QueueEngine, DEFAULT_VISIBILITY_TIMEOUT};
pub use error::QueueError;
pub use message::{Message, Payload};
pub use wonderq_core::MessageId;
