use serde::{Deserialize, Serialize};

/// Default accent used when a feed does not set one
pub const DEFAULT_COLOR: u32 = 0x3498db;

/// Feed dialect expected from a configured URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    #[default]
    Auto,
    Rss,
    Atom,
}

impl FeedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFormat::Auto => "auto",
            FeedFormat::Rss => "rss",
            FeedFormat::Atom => "atom",
        }
    }

    /// Whether a parsed document of the given type is acceptable
    pub fn accepts(&self, parsed: &feed_rs::model::FeedType) -> bool {
        use feed_rs::model::FeedType;

        match self {
            FeedFormat::Auto => true,
            FeedFormat::Rss => matches!(
                parsed,
                FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2
            ),
            FeedFormat::Atom => matches!(parsed, FeedType::Atom),
        }
    }
}

impl std::fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One watched feed, as declared in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_color")]
    pub color: u32,
    #[serde(default)]
    pub format: FeedFormat,
}

fn default_color() -> u32 {
    DEFAULT_COLOR
}

impl FeedConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            color: DEFAULT_COLOR,
            format: FeedFormat::Auto,
        }
    }
}
