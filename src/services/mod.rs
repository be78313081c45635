pub mod check_service;
pub mod notification_service;
pub mod scheduler;
pub mod stats_service;

pub use check_service::{preview, CheckReport, CheckService, Selection};
pub use notification_service::{Notifier, WebhookNotifier};
pub use scheduler::{Scheduler, Shutdown};
pub use stats_service::StatsService;
