//! Configuration management

use anyhow::ensure;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use wonderq_queue::QueueConfig;

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub queue: QueueSettings,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Overall deadline for a single HTTP request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueueSettings {
    /// How long a dequeued message stays pending before redelivery
    #[serde(default = "default_visibility_timeout_ms")]
    pub visibility_timeout_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            visibility_timeout_ms: default_visibility_timeout_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            queue: QueueSettings::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_visibility_timeout_ms() -> u64 {
    20_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Without an explicit path, `wonderq.toml` in the working directory is
    /// read if present. Environment variables such as
    /// `WONDERQ_SERVER__PORT` or `WONDERQ_QUEUE__VISIBILITY_TIMEOUT_MS`
    /// override file values.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("wonderq").required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("WONDERQ")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        Ok(builder.build()?.try_deserialize::<Config>()?)
    }

    /// Checked after command-line overrides are applied
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.queue.visibility_timeout_ms > 0,
            "visibility timeout must be greater than zero"
        );
        ensure!(
            self.server.request_timeout_ms > 0,
            "request timeout must be greater than zero"
        );
        Ok(())
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            visibility_timeout: Duration::from_millis(self.queue.visibility_timeout_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }
}
