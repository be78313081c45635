use std::collections::HashSet;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::domain::entry::sort_newest_first;
use crate::domain::{Entry, FeedConfig};
use crate::services::notification_service::Notifier;
use crate::sources::FeedFetcher;
use crate::storage::{SeenState, StateStore};

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub feeds_checked: usize,
    pub feeds_failed: usize,
    pub new_entries: usize,
    pub notified: usize,
    pub failed: usize,
    /// Unseen entries held back by the per-check limit, eligible next tick
    pub deferred: usize,
}

/// Unseen entries of one feed chosen for delivery
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Oldest first, the order they are delivered in
    pub to_notify: Vec<Entry>,
    pub deferred: usize,
}

/// Keep unseen entries, bounded to the `max` most recently published
pub fn select_new(entries: Vec<Entry>, state: &SeenState, max: usize) -> Selection {
    let mut ids = HashSet::new();
    let mut unseen: Vec<Entry> = entries
        .into_iter()
        .filter(|e| !state.is_seen(&e.id) && ids.insert(e.id.clone()))
        .collect();

    sort_newest_first(&mut unseen);
    let deferred = unseen.len().saturating_sub(max);
    unseen.truncate(max);
    unseen.reverse();

    Selection {
        to_notify: unseen,
        deferred,
    }
}

/// Entries a check would deliver, without delivering or marking anything
pub fn preview<F: FeedFetcher>(
    fetcher: &F,
    feeds: &[FeedConfig],
    state: &SeenState,
    max: usize,
) -> Vec<(FeedConfig, Selection)> {
    let mut results = Vec::new();

    for feed in feeds {
        match fetcher.fetch(feed) {
            Ok(entries) => {
                let selection = select_new(entries, state, max);
                if !selection.to_notify.is_empty() {
                    results.push((feed.clone(), selection));
                }
            }
            Err(e) => {
                error!(feed = %feed.name, url = %feed.url, error = %e, "Failed to fetch feed");
            }
        }
    }

    results
}

pub struct CheckService<F: FeedFetcher, N: Notifier, S: StateStore> {
    fetcher: F,
    notifier: N,
    store: S,
    feeds: Vec<FeedConfig>,
    max_items_per_check: usize,
    retention: Option<Duration>,
}

impl<F: FeedFetcher, N: Notifier, S: StateStore> CheckService<F, N, S> {
    pub fn new(
        fetcher: F,
        notifier: N,
        store: S,
        feeds: Vec<FeedConfig>,
        max_items_per_check: usize,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            store,
            feeds,
            max_items_per_check,
            retention: None,
        }
    }

    /// Forget seen records older than `days`; 0 keeps them forever
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention = (days > 0).then(|| Duration::days(i64::from(days)));
        self
    }

    /// Run one fetch, dedup, notify and persist cycle over every feed
    pub fn run_check(&self, state: &mut SeenState) -> CheckReport {
        info!(feeds = self.feeds.len(), "Checking feeds for new listings");
        let mut report = CheckReport::default();

        for feed in &self.feeds {
            let entries = match self.fetcher.fetch(feed) {
                Ok(entries) => entries,
                Err(e) => {
                    error!(feed = %feed.name, url = %feed.url, error = %e, "Failed to fetch feed");
                    report.feeds_failed += 1;
                    continue;
                }
            };
            report.feeds_checked += 1;

            let fetched = entries.len();
            let selection = select_new(entries, state, self.max_items_per_check);
            report.new_entries += selection.to_notify.len() + selection.deferred;
            report.deferred += selection.deferred;

            info!(
                feed = %feed.name,
                fetched,
                new = selection.to_notify.len() + selection.deferred,
                "Feed fetched"
            );

            if selection.deferred > 0 {
                warn!(
                    feed = %feed.name,
                    deferred = selection.deferred,
                    limit = self.max_items_per_check,
                    "Too many new listings, older ones are left for the next check"
                );
            }

            for entry in &selection.to_notify {
                match self.notifier.notify(entry, feed) {
                    Ok(()) => {
                        state.mark_delivered(entry);
                        self.persist(state);
                        report.notified += 1;
                    }
                    Err(e) => {
                        error!(
                            feed = %feed.name,
                            id = %entry.id,
                            rate_limited = e.is_rate_limited(),
                            error = %e,
                            "Failed to deliver notification, will retry next check"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        let now = Utc::now();
        state.record_check(now);
        if let Some(cutoff) = self.retention.and_then(|r| now.checked_sub_signed(r)) {
            let evicted = state.evict_older_than(cutoff);
            if evicted > 0 {
                info!(evicted, "Forgot old seen listings");
            }
        }
        self.persist(state);

        info!(
            notified = report.notified,
            failed = report.failed,
            deferred = report.deferred,
            feeds_failed = report.feeds_failed,
            "Check complete"
        );
        report
    }

    fn persist(&self, state: &SeenState) {
        if let Err(e) = self.store.save(state) {
            error!(error = %e, "Failed to save state");
        }
    }
}
