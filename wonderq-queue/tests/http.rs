//! Integration tests for the queue HTTP handlers
//!
//! These tests drive the handlers through an axum router the same way the
//! server mounts them.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::{delete, post, put},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use wonderq_queue::{handlers, QueueConfig, QueueEngine};

const TIMEOUT: Duration = Duration::from_secs(20);

/// Create a test queue router and keep a handle on its engine
fn create_test_router() -> (Router, Arc<QueueEngine>) {
    let queue = Arc::new(QueueEngine::new(QueueConfig {
        visibility_timeout: TIMEOUT,
    }));

    let router = Router::new()
        .route("/enqueue", post(handlers::handle_enqueue))
        .route("/dequeue", put(handlers::handle_dequeue))
        .route("/acknowledge", delete(handlers::handle_acknowledge))
        .with_state(queue.clone());

    (router, queue)
}

async fn send(router: &Router, method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn send_json(router: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, method, uri, body.to_string()).await
}

async fn enqueue(router: &Router, body: Value) -> String {
    let (status, value) = send_json(router, Method::POST, "/enqueue", body).await;
    assert_eq!(status, StatusCode::OK);
    value["messageId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_enqueue_returns_message_id() {
    let (router, queue) = create_test_router();

    let id = enqueue(&router, json!({"task": "resize"})).await;

    assert_eq!(queue.len(), 1);
    assert!(queue.is_queued(&id));
}

#[tokio::test]
async fn test_enqueue_empty_body() {
    let (router, queue) = create_test_router();

    for body in ["", "{}"] {
        let (status, value) = send(&router, Method::POST, "/enqueue", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["status"], "Error: the request body is empty");
        assert_eq!(value["code"], "EmptyPayload");
    }

    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_enqueue_malformed_body() {
    let (router, queue) = create_test_router();

    let (status, value) = send(&router, Method::POST, "/enqueue", "[1, 2, 3]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["code"], "MalformedBody");

    let (status, _) = send(&router, Method::POST, "/enqueue", "{oops").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_dequeue_returns_flat_messages_in_order() {
    let (router, _queue) = create_test_router();

    let id1 = enqueue(&router, json!({"testKey1": "testValue1"})).await;
    let id2 = enqueue(&router, json!({"testKey2": "testValue2"})).await;
    enqueue(&router, json!({"testKey3": "testValue3"})).await;

    let (status, value) = send_json(&router, Method::PUT, "/dequeue", json!({"amount": 2})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        value,
        json!({
            "messages": [
                {"testKey1": "testValue1", "messageId": id1},
                {"testKey2": "testValue2", "messageId": id2}
            ]
        })
    );
}

#[tokio::test]
async fn test_dequeue_empty_queue() {
    let (router, _queue) = create_test_router();

    let (status, value) = send_json(&router, Method::PUT, "/dequeue", json!({"amount": 1})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!({"messages": []}));
}

#[tokio::test]
async fn test_dequeue_missing_amount() {
    let (router, queue) = create_test_router();
    let id = enqueue(&router, json!({"k": "v"})).await;

    let (status, value) = send_json(&router, Method::PUT, "/dequeue", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["status"], r#"Error: missing "amount" in the request body"#);
    assert!(queue.is_queued(&id));
    assert!(!queue.is_pending(&id));
}

#[tokio::test]
async fn test_dequeue_invalid_amount() {
    let (router, queue) = create_test_router();
    enqueue(&router, json!({"k": "v"})).await;

    for amount in [json!(-1), json!(1.5), json!("2")] {
        let (status, value) =
            send_json(&router, Method::PUT, "/dequeue", json!({ "amount": amount })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["code"], "InvalidAmount");
    }

    assert_eq!(queue.len(), 1);
    assert_eq!(queue.pending_len(), 0);
}

#[tokio::test]
async fn test_dequeue_integral_float_amount() {
    let (router, queue) = create_test_router();
    let id1 = enqueue(&router, json!({"k": 1})).await;
    enqueue(&router, json!({"k": 2})).await;

    let (status, value) = send_json(&router, Method::PUT, "/dequeue", json!({"amount": 1.0})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["messages"].as_array().unwrap().len(), 1);
    assert_eq!(value["messages"][0]["messageId"], id1.as_str());
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn test_acknowledge_success() {
    let (router, queue) = create_test_router();
    let id = enqueue(&router, json!({"k": "v"})).await;
    send_json(&router, Method::PUT, "/dequeue", json!({"amount": 1})).await;

    let (status, value) =
        send_json(&router, Method::DELETE, "/acknowledge", json!({"messageId": id})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!({"status": "Success"}));
    assert!(queue.is_empty());
    assert_eq!(queue.pending_len(), 0);

    // Repeating the ack is reported as gone
    let (status, value) =
        send_json(&router, Method::DELETE, "/acknowledge", json!({"messageId": id})).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(
        value["status"],
        "Error: this message has been reinserted in the queue"
    );
}

#[tokio::test]
async fn test_acknowledge_missing_id() {
    let (router, _queue) = create_test_router();

    for body in [json!({}), json!({"messageId": ""}), json!({"messageId": 42})] {
        let (status, value) = send_json(&router, Method::DELETE, "/acknowledge", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["status"], r#"Error: missing "messageId" in the request body"#);
    }
}

#[tokio::test(start_paused = true)]
async fn test_acknowledge_after_visibility_timeout() {
    let (router, queue) = create_test_router();
    let id = enqueue(&router, json!({"k": "v"})).await;
    send_json(&router, Method::PUT, "/dequeue", json!({"amount": 1})).await;

    tokio::time::sleep(TIMEOUT + Duration::from_millis(1)).await;

    let (status, _) =
        send_json(&router, Method::DELETE, "/acknowledge", json!({"messageId": id})).await;
    assert_eq!(status, StatusCode::GONE);
    assert!(queue.is_queued(&id));

    // The message is delivered again with the same id and payload
    let (_, value) = send_json(&router, Method::PUT, "/dequeue", json!({"amount": 1})).await;
    assert_eq!(value, json!({"messages": [{"k": "v", "messageId": id}]}));
}
