use std::path::PathBuf;

use thiserror::Error;

/// Failure to retrieve or parse one feed. Never aborts a tick.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Feed answered with status {0}")]
    Status(u16),

    #[error("Feed parsing failed: {0}")]
    Parse(String),

    #[error("Expected a {expected} feed but got {actual}")]
    FormatMismatch { expected: String, actual: String },
}

/// Failure to deliver one notification. The entry stays eligible for retry.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Webhook delivery failed: {0}")]
    Delivery(#[from] webhook::WebhookError),

    #[error("Webhook client setup failed: {0}")]
    Setup(String),
}

impl NotifyError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            NotifyError::Delivery(webhook::WebhookError::RateLimited { .. })
        )
    }
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read/write state file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("State file at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Webhook URL is not configured (set [webhook].url or WEBHOOK_URL)")]
    MissingWebhookUrl,

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
