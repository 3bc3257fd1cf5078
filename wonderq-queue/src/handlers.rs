//! HTTP handlers for the queue

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;
use wonderq_core::{ApiError, ErrorCode};

use crate::engine::{AckOutcome, QueueEngine};
use crate::message::{Payload, MESSAGE_ID_KEY};

/// POST /enqueue
pub async fn handle_enqueue(State(queue): State<Arc<QueueEngine>>, body: Bytes) -> Response {
    let payload = match parse_object(&body) {
        Ok(payload) => payload,
        Err(e) => return error_response(&e),
    };

    match queue.enqueue(Some(payload)) {
        Ok(message_id) => json_response(StatusCode::OK, &json!({ "messageId": message_id })),
        Err(e) => error_response(&e.into()),
    }
}

/// PUT /dequeue
pub async fn handle_dequeue(State(queue): State<Arc<QueueEngine>>, body: Bytes) -> Response {
    let payload = match parse_object(&body) {
        Ok(payload) => payload,
        Err(e) => return error_response(&e),
    };

    let amount = match payload.get("amount") {
        None | Some(Value::Null) => None,
        Some(value) => match parse_amount(value) {
            Some(n) => Some(n),
            None => return error_response(&ErrorCode::InvalidAmount.into()),
        },
    };

    match queue.dequeue(amount) {
        Ok(messages) => json_response(StatusCode::OK, &json!({ "messages": messages })),
        Err(e) => error_response(&e.into()),
    }
}

/// DELETE /acknowledge
pub async fn handle_acknowledge(State(queue): State<Arc<QueueEngine>>, body: Bytes) -> Response {
    let payload = match parse_object(&body) {
        Ok(payload) => payload,
        Err(e) => return error_response(&e),
    };

    let message_id = payload.get(MESSAGE_ID_KEY).and_then(Value::as_str);

    match queue.acknowledge(message_id) {
        Ok(AckOutcome::Acknowledged) => {
            json_response(StatusCode::OK, &json!({ "status": "Success" }))
        }
        Ok(AckOutcome::Stale) => error_response(&ErrorCode::MessageReinserted.into()),
        Err(e) => error_response(&e.into()),
    }
}

// === Body parsing ===

/// Parse a request body as a JSON object. An empty body reads as `{}`.
fn parse_object(body: &Bytes) -> Result<Payload, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Payload::new()),
        Ok(_) => Err(ErrorCode::MalformedBody.into()),
        Err(e) => {
            warn!(error = %e, "Rejecting request body that is not valid JSON");
            Err(ErrorCode::MalformedBody.into())
        }
    }
}

/// Read `amount` as a non-negative whole number. Integral floats such as
/// `2.0` count; amounts beyond `usize` saturate.
fn parse_amount(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return Some(usize::try_from(n).unwrap_or(usize::MAX));
    }

    let n = value.as_f64()?;
    (n.is_finite() && n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

// === Response helpers ===

pub fn json_response(status: StatusCode, body: &Value) -> Response {
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}

pub fn error_response(error: &ApiError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = Response::new(Body::from(error.to_json()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}
