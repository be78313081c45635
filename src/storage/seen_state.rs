use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Entry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_name: Option<String>,
    pub seen_at: DateTime<Utc>,
}

/// Identifiers already notified, plus bookkeeping counters.
///
/// An identifier present here is never notified again until [`SeenState::reset`]
/// is called or its record ages out through [`SeenState::evict_older_than`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeenState {
    #[serde(default)]
    seen_items: BTreeMap<String, SeenRecord>,
    #[serde(default)]
    total_notified: u64,
    #[serde(default)]
    last_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateStats {
    pub seen_count: usize,
    pub total_notified: u64,
    pub last_check: Option<DateTime<Utc>>,
    pub by_feed: BTreeMap<String, usize>,
    pub oldest_title: Option<String>,
    pub newest_title: Option<String>,
}

impl SeenState {
    pub fn is_seen(&self, id: &str) -> bool {
        self.seen_items.contains_key(id)
    }

    /// Insert identifiers; already-present ones are left untouched
    pub fn mark_seen<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        for id in ids {
            self.seen_items.entry(id.into()).or_insert_with(|| SeenRecord {
                title: None,
                feed_name: None,
                seen_at: now,
            });
        }
    }

    /// Record a successfully delivered entry
    pub fn mark_delivered(&mut self, entry: &Entry) {
        self.seen_items.insert(
            entry.id.clone(),
            SeenRecord {
                title: Some(entry.title.clone()),
                feed_name: Some(entry.feed_name.clone()),
                seen_at: Utc::now(),
            },
        );
        self.total_notified += 1;
    }

    pub fn record_check(&mut self, at: DateTime<Utc>) {
        self.last_check = Some(at);
    }

    /// Drop records first seen before `cutoff`, returning how many went
    pub fn evict_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.seen_items.len();
        self.seen_items.retain(|_, record| record.seen_at >= cutoff);
        before - self.seen_items.len()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.seen_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen_items.is_empty()
    }

    pub fn total_notified(&self) -> u64 {
        self.total_notified
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    pub fn stats(&self) -> StateStats {
        let mut by_feed = BTreeMap::new();
        for record in self.seen_items.values() {
            let feed = record.feed_name.clone().unwrap_or_else(|| "Unknown".to_string());
            *by_feed.entry(feed).or_insert(0) += 1;
        }

        let titled = || self.seen_items.values().filter(|r| r.title.is_some());
        let oldest_title = titled().min_by_key(|r| r.seen_at).and_then(|r| r.title.clone());
        let newest_title = titled().max_by_key(|r| r.seen_at).and_then(|r| r.title.clone());

        StateStats {
            seen_count: self.seen_items.len(),
            total_notified: self.total_notified,
            last_check: self.last_check,
            by_feed,
            oldest_title,
            newest_title,
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_record(&mut self, id: &str, record: SeenRecord) {
        self.seen_items.insert(id.to_string(), record);
    }
}
