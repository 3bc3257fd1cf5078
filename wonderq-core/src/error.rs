//! Wire error types and formatting

use serde::Serialize;
use thiserror::Error;

/// Error codes reported by the WonderQ API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Request validation
    EmptyPayload,
    MissingAmount,
    InvalidAmount,
    MissingMessageId,
    MalformedBody,

    // Acknowledgment arrived after the message went back to the queue
    MessageReinserted,

    // Transport
    RequestTimeout,

    // Server
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyPayload => "EmptyPayload",
            Self::MissingAmount => "MissingAmount",
            Self::InvalidAmount => "InvalidAmount",
            Self::MissingMessageId => "MissingMessageId",
            Self::MalformedBody => "MalformedBody",
            Self::MessageReinserted => "MessageReinserted",
            Self::RequestTimeout => "RequestTimeout",
            Self::InternalError => "InternalError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::EmptyPayload
            | Self::MissingAmount
            | Self::InvalidAmount
            | Self::MissingMessageId
            | Self::MalformedBody => 400,
            Self::RequestTimeout => 408,
            Self::MessageReinserted => 410,
            Self::InternalError => 500,
        }
    }

    /// Message shown to clients when no more specific text is given
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::EmptyPayload => "Error: the request body is empty",
            Self::MissingAmount => r#"Error: missing "amount" in the request body"#,
            Self::InvalidAmount => r#"Error: "amount" must be a non-negative integer"#,
            Self::MissingMessageId => r#"Error: missing "messageId" in the request body"#,
            Self::MalformedBody => "Error: the request body must be a JSON object",
            Self::MessageReinserted => "Error: this message has been reinserted in the queue",
            Self::RequestTimeout => "Error: the request has timed out",
            Self::InternalError => "Error: internal server error",
        }
    }
}

/// API error returned to HTTP clients
#[derive(Debug, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub request_id: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Format as a JSON error body
    pub fn to_json(&self) -> String {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct JsonError<'a> {
            status: &'a str,
            code: &'a str,
            request_id: &'a str,
        }

        let error = JsonError {
            status: &self.message,
            code: self.code.as_str(),
            request_id: &self.request_id,
        };

        serde_json::to_string(&error).unwrap_or_else(|_| {
            format!(r#"{{"status":"{}","code":"{}"}}"#, self.message, self.code.as_str())
        })
    }
}

impl From<ErrorCode> for ApiError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }
}
