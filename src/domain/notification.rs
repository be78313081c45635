use chrono::{DateTime, Utc};
use webhook::{Embed, EmbedField, EmbedFooter};

use super::{Entry, FeedConfig};

/// Longest excerpt shown in an embed before it gets cut
pub const EXCERPT_MAX_CHARS: usize = 300;

const FOOTER_TEXT: &str = "New listing available";

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub feed_name: String,
    pub color: u32,
    pub title: String,
    pub url: Option<String>,
    pub text: String,
    pub budget: Option<String>,
    pub categories: Vec<String>,
    pub published: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn from_entry(feed: &FeedConfig, entry: &Entry) -> Self {
        Self {
            feed_name: feed.name.clone(),
            color: feed.color,
            title: entry.title.clone(),
            url: entry.link.clone(),
            text: excerpt(&entry.description, EXCERPT_MAX_CHARS),
            budget: entry.budget.clone(),
            categories: entry.categories.clone(),
            published: entry.published,
        }
    }

    /// Build the embed posted to the webhook; `now` becomes the embed timestamp
    pub fn to_embed(&self, now: DateTime<Utc>) -> Embed {
        let categories = if self.categories.is_empty() {
            "Not specified".to_string()
        } else {
            self.categories.join(", ")
        };

        let fields = vec![
            EmbedField::new(
                "Budget",
                self.budget.clone().unwrap_or_else(|| "Not specified".to_string()),
                true,
            ),
            EmbedField::new("Categories", categories, true),
            EmbedField::new("Source", self.feed_name.clone(), true),
            EmbedField::new("Published", format_published(self.published), false),
        ];

        Embed {
            title: Some(self.title.clone()),
            url: self.url.clone(),
            color: Some(self.color),
            description: (!self.text.is_empty()).then(|| self.text.clone()),
            fields,
            footer: Some(EmbedFooter {
                text: format!("{} • {}", self.feed_name, FOOTER_TEXT),
                icon_url: None,
            }),
            timestamp: Some(now.to_rfc3339()),
        }
    }

    /// One-line form used by dry runs
    pub fn format(&self) -> String {
        let mut message = format!("[{}] {}", self.feed_name, self.title);

        if let Some(budget) = &self.budget {
            message.push_str(&format!(" ({})", budget));
        }

        if let Some(url) = &self.url {
            message.push(' ');
            message.push_str(url);
        }

        message
    }
}

/// Cut text to at most `max_chars` characters, appending "..." when shortened
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

pub fn format_published(published: Option<DateTime<Utc>>) -> String {
    match published {
        Some(dt) => dt.format("%-d %B %Y at %H:%M UTC").to_string(),
        None => "Unknown date".to_string(),
    }
}
