pub mod feed;
pub mod entry;
pub mod notification;

pub use feed::{FeedConfig, FeedFormat};
pub use entry::Entry;
pub use notification::Notification;
