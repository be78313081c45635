use chrono::Utc;
use tracing::{info, warn};
use url::Url;
use webhook::{Embed, EmbedFooter, WebhookClient, WebhookError};

use crate::config::{HttpSettings, WebhookSettings};
use crate::domain::{Entry, FeedConfig, Notification};
use crate::errors::NotifyError;

const TEST_COLOR: u32 = 0x00ff00;

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Deliver one entry; an error means the entry was not delivered
    fn notify(&self, entry: &Entry, feed: &FeedConfig) -> Result<(), NotifyError>;

    /// Post a test message to check the endpoint is reachable
    fn test_connection(&self) -> Result<(), NotifyError>;
}

pub struct WebhookNotifier {
    client: WebhookClient,
}

impl WebhookNotifier {
    pub fn new(
        endpoint: &Url,
        settings: &WebhookSettings,
        http: &HttpSettings,
    ) -> Result<Self, NotifyError> {
        let client = WebhookClient::new(endpoint.as_str(), &http.user_agent, http.timeout())
            .map_err(|e| NotifyError::Setup(e.to_string()))?
            .with_username(Some(settings.display_name()))
            .with_avatar_url(settings.avatar_url.clone());

        Ok(Self { client })
    }

    /// Send a notification, shortening its text if the endpoint rejects the size
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        // Try with full message first
        match self.client.send_embed(notification.to_embed(Utc::now())) {
            Ok(()) => return Ok(()),
            Err(WebhookError::PayloadTooLarge) => {}
            Err(e) => return Err(e.into()),
        }

        warn!(title = %notification.title, "Payload too large, shortening description");
        let mut truncated = notification.clone();

        // Halve the text until the payload fits
        let mut len = notification.text.chars().count() / 2;

        while len > 0 {
            truncated.text = truncate_to_char_boundary(&notification.text, len);

            match self.client.send_embed(truncated.to_embed(Utc::now())) {
                Ok(()) => return Ok(()),
                Err(WebhookError::PayloadTooLarge) => len /= 2,
                Err(e) => return Err(e.into()),
            }
        }

        // Try with no text at all
        truncated.text = String::new();
        self.client.send_embed(truncated.to_embed(Utc::now()))?;
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, entry: &Entry, feed: &FeedConfig) -> Result<(), NotifyError> {
        let notification = Notification::from_entry(feed, entry);
        self.send(&notification)?;
        info!(feed = %feed.name, id = %entry.id, title = %entry.title, "Notification sent");
        Ok(())
    }

    fn test_connection(&self) -> Result<(), NotifyError> {
        let embed = Embed {
            title: Some("Connection test".to_string()),
            description: Some("feedhook is up and able to post to this channel.".to_string()),
            color: Some(TEST_COLOR),
            footer: Some(EmbedFooter {
                text: "Configuration test".to_string(),
                icon_url: None,
            }),
            timestamp: Some(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        self.client.send_embed(embed)?;
        info!("Webhook test succeeded");
        Ok(())
    }
}

/// Truncate string to at most `max_chars` characters, respecting char boundaries
fn truncate_to_char_boundary(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
