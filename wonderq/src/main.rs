//! WonderQ - in-memory message queue
//!
//! Serves a single queue over HTTP. Dequeued messages that are not
//! acknowledged within the visibility timeout are put back at the front of
//! the queue for redelivery.

mod config;
mod router;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wonderq_queue::QueueEngine;

#[derive(Parser, Debug)]
#[command(name = "wonderq")]
#[command(about = "In-memory message queue with visibility-timeout redelivery", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./wonderq.toml when present)
    #[arg(short, long, env = "WONDERQ_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "WONDERQ_PORT")]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "WONDERQ_HOST")]
    host: Option<String>,

    /// Milliseconds a dequeued message stays pending before redelivery
    #[arg(long, env = "WONDERQ_VISIBILITY_TIMEOUT_MS")]
    visibility_timeout_ms: Option<u64>,

    /// Milliseconds before an HTTP request is abandoned with 408
    #[arg(long, env = "WONDERQ_REQUEST_TIMEOUT_MS")]
    request_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WONDERQ_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    /// Command-line flags win over file and environment configuration
    fn apply(self, config: &mut crate::config::Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(ms) = self.visibility_timeout_ms {
            config.queue.visibility_timeout_ms = ms;
        }
        if let Some(ms) = self.request_timeout_ms {
            config.server.request_timeout_ms = ms;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = crate::config::Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "wonderq={level},wonderq_queue={level},tower_http=debug",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let queue_config = config.queue_config();
    info!("Starting WonderQ...");
    info!("  Visibility timeout: {:?}", queue_config.visibility_timeout);
    info!("  Request timeout: {:?}", config.request_timeout());

    let queue = Arc::new(QueueEngine::new(queue_config));
    let state = router::AppState::new(queue);

    // Create router
    let app = router::create_router(state, config.request_timeout());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on http://{}{}", addr, router::API_PREFIX);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
