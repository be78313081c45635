//! Chat webhook bindings for Rust
//! Provides the embed payload types and a blocking client that posts them to a
//! Discord-compatible webhook endpoint

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Rate limited by webhook endpoint (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<f64> },
    #[error("Webhook endpoint answered with status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// ISO-8601 timestamp shown by the chat client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embeds: Vec<Embed>,
}

pub struct WebhookClient {
    url: String,
    username: Option<String>,
    avatar_url: Option<String>,
    client: Client,
}

impl WebhookClient {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self, WebhookError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|_| WebhookError::InvalidHeader)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            url: url.to_string(),
            username: None,
            avatar_url: None,
            client,
        })
    }

    /// Display name used for every message posted by this client
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url.filter(|u| !u.is_empty());
        self
    }

    /// Wrap embeds into a payload carrying this client's identity
    pub fn payload(&self, embeds: Vec<Embed>) -> WebhookPayload {
        WebhookPayload {
            content: None,
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            embeds,
        }
    }

    /// Post a payload to the webhook
    pub fn execute(&self, payload: &WebhookPayload) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(payload).send()?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok());

        if status.is_success() {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        Err(classify_failure(status, retry_after, body))
    }

    /// Post a single embed
    pub fn send_embed(&self, embed: Embed) -> Result<(), WebhookError> {
        self.execute(&self.payload(vec![embed]))
    }
}

/// Map a non-success status to the matching error
pub fn classify_failure(status: StatusCode, retry_after: Option<f64>, body: String) -> WebhookError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => WebhookError::RateLimited { retry_after },
        StatusCode::PAYLOAD_TOO_LARGE => WebhookError::PayloadTooLarge,
        _ => WebhookError::Status {
            status: status.as_u16(),
            body,
        },
    }
}
