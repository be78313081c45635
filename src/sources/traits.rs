use crate::domain::{Entry, FeedConfig};
use crate::errors::FetchError;

#[cfg_attr(test, mockall::automock)]
pub trait FeedFetcher: Send + Sync {
    /// Fetch one feed, returning its entries most recent first
    fn fetch(&self, feed: &FeedConfig) -> Result<Vec<Entry>, FetchError>;
}
