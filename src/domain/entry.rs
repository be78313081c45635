use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// One listing parsed from a feed. Rebuilt on every fetch, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub description: String,
    pub categories: Vec<String>,
    pub budget: Option<String>,
    pub feed_name: String,
}

impl Entry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, feed_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            link: None,
            published: None,
            description: String::new(),
            categories: Vec::new(),
            budget: None,
            feed_name: feed_name.into(),
        }
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_budget(mut self, budget: Option<String>) -> Self {
        self.budget = budget;
        self
    }
}

/// Most recent first; undated entries sort after dated ones
pub fn newest_first(a: &Entry, b: &Entry) -> Ordering {
    match (a.published, b.published) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort, so entries with equal dates keep document order
pub fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(newest_first);
}
