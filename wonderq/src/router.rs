//! HTTP router for WonderQ

use axum::{
    error_handling::HandleErrorLayer,
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post, put},
    BoxError, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};
use wonderq_core::ErrorCode;
use wonderq_queue::{handlers, QueueEngine};

/// Base path every route is mounted under
pub const API_PREFIX: &str = "/wonderq/api";

const APP_NAME: &str = "WonderQ";

/// Service state for the main router
#[derive(Clone)]
pub struct AppState {
    queue: Arc<QueueEngine>,
    started_at: Instant,
}

impl AppState {
    pub fn new(queue: Arc<QueueEngine>) -> Self {
        Self {
            queue,
            started_at: Instant::now(),
        }
    }
}

impl FromRef<AppState> for Arc<QueueEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.queue.clone()
    }
}

/// Create the main application router
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .route("/enqueue", post(handlers::handle_enqueue))
        .route("/dequeue", put(handlers::handle_dequeue))
        .route("/acknowledge", delete(handlers::handle_acknowledge));

    with_middleware(Router::new().nest(API_PREFIX, api), request_timeout).with_state(state)
}

/// Request deadline, CORS and request tracing around every route
fn with_middleware(router: Router<AppState>, request_timeout: Duration) -> Router<AppState> {
    router
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_check(State(state): State<AppState>) -> Response {
    handlers::json_response(
        StatusCode::OK,
        &json!({
            "appName": APP_NAME,
            "uptime": state.started_at.elapsed().as_secs_f64(),
            "message": "OK",
            "timestamp": chrono::Utc::now().timestamp_millis(),
        }),
    )
}

async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request has timed out");
        return handlers::error_response(&ErrorCode::RequestTimeout.into());
    }

    error!(error = %err, "Unhandled middleware error");
    handlers::json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &json!({ "status": format!("Error: {err}") }),
    )
}
