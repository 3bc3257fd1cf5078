//! Message ID generation

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// System-assigned message identifier
///
/// Generated once at enqueue time and never reused. Comparison is
/// case-sensitive, so an identifier only matches its exact string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a new random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create an identifier with a specific value (for testing)
    pub fn with_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Lets maps keyed by MessageId be queried with a plain &str.
impl Borrow<str> for MessageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
