//! Configuration for feedhook.
//!
//! Settings are read from a TOML file (default `config.toml`). A `.env` file
//! next to the executable or in the working directory is loaded first, and a
//! handful of environment variables override values from the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::domain::FeedConfig;
use crate::errors::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Value shipped in the sample configuration; never a usable endpoint
const PLACEHOLDER_WEBHOOK: &str = "https://discord.com/api/webhooks/YOUR_WEBHOOK_URL";

/// One week
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
/// One hundred years
pub const MAX_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl WebhookSettings {
    /// Validated endpoint, required by every command that delivers messages
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty() && *u != PLACEHOLDER_WEBHOOK)
            .ok_or(ConfigError::MissingWebhookUrl)?;

        parse_http_url("webhook.url", raw)
    }

    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "feedhook".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub check_interval_minutes: u64,
    pub max_items_per_check: usize,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            check_interval_minutes: 5,
            max_items_per_check: 10,
        }
    }
}

impl ScheduleSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub state_file: PathBuf,
    /// Seen records older than this are forgotten; 0 keeps them forever
    pub retention_days: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("seen_items.json"),
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("feedhook/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub webhook: WebhookSettings,
    pub schedule: ScheduleSettings,
    pub storage: StorageSettings,
    pub http: HttpSettings,
    pub logging: LoggingSettings,
    pub feeds: Vec<FeedConfig>,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Load `.env`, the TOML file at `path`, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config = Self::from_toml(&content, path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply environment overrides; `lookup` returns a variable's value
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("WEBHOOK_URL") {
            self.webhook.url = Some(url);
        }
        if let Some(username) = get("WEBHOOK_USERNAME") {
            self.webhook.username = Some(username);
        }
        if let Some(avatar_url) = get("WEBHOOK_AVATAR_URL") {
            self.webhook.avatar_url = Some(avatar_url);
        }
        if let Some(minutes) = get("CHECK_INTERVAL_MINUTES") {
            self.schedule.check_interval_minutes = parse_number("CHECK_INTERVAL_MINUTES", &minutes)?;
        }
        if let Some(max) = get("MAX_ITEMS_PER_CHECK") {
            self.schedule.max_items_per_check = parse_number("MAX_ITEMS_PER_CHECK", &max)?;
        }
        if let Some(state_file) = get("STATE_FILE") {
            self.storage.state_file = PathBuf::from(state_file);
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.check_interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "schedule.check_interval_minutes".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.schedule.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(ConfigError::InvalidValue {
                field: "schedule.check_interval_minutes".to_string(),
                reason: format!("must be at most {}", MAX_CHECK_INTERVAL_MINUTES),
            });
        }

        if self.schedule.max_items_per_check == 0 {
            return Err(ConfigError::InvalidValue {
                field: "schedule.max_items_per_check".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.storage.retention_days > MAX_RETENTION_DAYS {
            return Err(ConfigError::InvalidValue {
                field: "storage.retention_days".to_string(),
                reason: format!("must be at most {}", MAX_RETENTION_DAYS),
            });
        }

        for feed in &self.feeds {
            parse_http_url(&format!("feeds.{}.url", feed.name), &feed.url)?;
        }

        Ok(())
    }
}

fn parse_http_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: format!("'{}' is not a valid number", raw),
    })
}
