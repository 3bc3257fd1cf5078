//! Queued message type

use serde::Serialize;
use serde_json::{Map, Value};
use wonderq_core::MessageId;

/// Caller-supplied message body
pub type Payload = Map<String, Value>;

/// Key under which the system identifier appears on the wire
pub const MESSAGE_ID_KEY: &str = "messageId";

/// A payload plus its system-assigned identifier
///
/// Serializes as the payload object with `messageId` added alongside the
/// caller's keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "messageId")]
    pub message_id: MessageId,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Message {
    /// Wrap a payload with a freshly generated identifier.
    ///
    /// A `messageId` key supplied by the caller is dropped in favour of the
    /// generated one.
    pub fn new(mut payload: Payload) -> Self {
        payload.remove(MESSAGE_ID_KEY);
        Self {
            message_id: MessageId::new(),
            payload,
        }
    }
}
