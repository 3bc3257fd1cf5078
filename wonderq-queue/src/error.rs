//! Queue validation errors

use thiserror::Error;
use wonderq_core::{ApiError, ErrorCode};

/// Errors detected before the queue is touched
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("payload is empty or absent")]
    EmptyPayload,
    #[error("amount is missing")]
    MissingAmount,
    #[error("message id is missing")]
    MissingMessageId,
    #[error("dequeue needs a Tokio runtime to arm the redelivery timer")]
    NoRuntime,
}

impl QueueError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyPayload => ErrorCode::EmptyPayload,
            Self::MissingAmount => ErrorCode::MissingAmount,
            Self::MissingMessageId => ErrorCode::MissingMessageId,
            Self::NoRuntime => ErrorCode::InternalError,
        }
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        ApiError::from(err.code())
    }
}
