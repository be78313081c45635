use std::fmt::Write;

use tracing::info;

use crate::errors::StateError;
use crate::storage::{StateStats, StateStore};

pub struct StatsService<S: StateStore> {
    store: S,
}

impl<S: StateStore> StatsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn stats(&self) -> Result<StateStats, StateError> {
        Ok(self.store.load()?.stats())
    }

    /// Clear every seen identifier and counter
    pub fn reset(&self) -> Result<(), StateError> {
        self.store.reset()?;
        info!("State reset");
        Ok(())
    }
}

/// Human-readable report printed by the `stats` command
pub fn render(stats: &StateStats) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Seen items: {}", stats.seen_count);
    let _ = writeln!(out, "Notifications sent: {}", stats.total_notified);
    let _ = writeln!(
        out,
        "Last check: {}",
        stats
            .last_check
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string())
    );

    if !stats.by_feed.is_empty() {
        let _ = writeln!(out, "By feed:");
        for (feed, count) in &stats.by_feed {
            let _ = writeln!(out, "  {}: {}", feed, count);
        }
    }

    if let Some(title) = &stats.oldest_title {
        let _ = writeln!(out, "Oldest remembered: {}", title);
    }
    if let Some(title) = &stats.newest_title {
        let _ = writeln!(out, "Latest notified: {}", title);
    }

    out
}
