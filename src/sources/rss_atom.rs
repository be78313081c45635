use std::time::Duration;

use feed_rs::model::{Link, Text};
use feed_rs::parser;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, warn};

use crate::domain::entry::sort_newest_first;
use crate::domain::{Entry, FeedConfig};
use crate::errors::FetchError;
use crate::sources::listing::{html_to_text, merge_categories, parse_listing};
use crate::sources::traits::FeedFetcher;

pub struct HttpFeedFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            user_agent: user_agent.to_string(),
        }
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.bytes()?.to_vec())
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch(&self, feed: &FeedConfig) -> Result<Vec<Entry>, FetchError> {
        debug!(feed = %feed.name, url = %feed.url, "Fetching feed");
        let bytes = self.fetch_bytes(&feed.url)?;
        parse_entries(&bytes, feed)
    }
}

/// Id for items without a guid: the first link, or empty so the item is skipped
fn link_id(links: &[Link], _title: &Option<Text>, _base_uri: Option<&str>) -> String {
    links
        .first()
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default()
}

/// Parse a feed document into entries, most recent first
pub fn parse_entries(bytes: &[u8], feed: &FeedConfig) -> Result<Vec<Entry>, FetchError> {
    let parsed = parser::Builder::new()
        .id_generator(link_id)
        .build()
        .parse(bytes)
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    if !feed.format.accepts(&parsed.feed_type) {
        return Err(FetchError::FormatMismatch {
            expected: feed.format.to_string(),
            actual: format!("{:?}", parsed.feed_type),
        });
    }

    let mut entries = Vec::with_capacity(parsed.entries.len());

    for entry in parsed.entries {
        let id = entry.id.trim().to_string();
        if id.is_empty() {
            warn!(feed = %feed.name, "Skipping entry without guid or link");
            continue;
        }

        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .filter(|href| !href.is_empty());
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());

        let raw_description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();
        let details = parse_listing(&html_to_text(&raw_description));

        let feed_categories: Vec<String> = entry
            .categories
            .into_iter()
            .map(|c| c.label.unwrap_or(c.term).trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        entries.push(
            Entry::new(id, title.unwrap_or_else(|| "Untitled".to_string()), feed.name.clone())
                .with_link(link)
                .with_published(entry.published.or(entry.updated))
                .with_description(details.excerpt)
                .with_categories(merge_categories(feed_categories, details.categories))
                .with_budget(details.budget),
        );
    }

    sort_newest_first(&mut entries);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedFormat;
    use crate::test_support::{unreachable_url, Reply, StubServer};

    fn feed() -> FeedConfig {
        FeedConfig::new("Codeur - Dev", "https://www.codeur.com/projects.rss")
    }

    const SAMPLE_RSS: &[u8] = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Codeur.com - Projets</title>
    <link>https://www.codeur.com/projects</link>
    <description>Derniers projets</description>
    <item>
      <title>Application mobile de livraison</title>
      <link>https://www.codeur.com/projects/100-application-mobile</link>
      <guid>https://www.codeur.com/projects/100</guid>
      <pubDate>Mon, 15 Jan 2024 08:00:00 +0000</pubDate>
      <category>Mobile</category>
      <description><![CDATA[<p>Budget : 1 000 € à 10 000 € - Catégories : Application mobile, iOS</p><p>Nous voulons une application.</p><p><a href="https://www.codeur.com/projects/100">Voir ce projet sur Codeur</a></p>]]></description>
    </item>
    <item>
      <title>Site vitrine</title>
      <link>https://www.codeur.com/projects/101-site-vitrine</link>
      <guid>https://www.codeur.com/projects/101</guid>
      <pubDate>Mon, 15 Jan 2024 10:00:00 +0000</pubDate>
      <description><![CDATA[<p>Budget : Moins de 500 € - Catégories : Site internet</p><p>Un site simple.</p>]]></description>
    </item>
    <item>
      <description>No title and no link</description>
    </item>
  </channel>
</rss>"#
        .as_bytes();

    const SAMPLE_ATOM: &[u8] = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <id>https://example.com/feed.atom</id>
  <updated>2024-01-15T12:00:00Z</updated>
  <entry>
    <title>Atom entry</title>
    <link href="https://example.com/posts/1"/>
    <id>https://example.com/posts/1</id>
    <updated>2024-01-15T12:00:00Z</updated>
  </entry>
</feed>"#
        .as_bytes();

    #[test]
    fn test_parse_entries_most_recent_first() {
        let entries = parse_entries(SAMPLE_RSS, &feed()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Site vitrine");
        assert_eq!(entries[1].title, "Application mobile de livraison");
    }

    #[test]
    fn test_parse_entries_uses_guid_as_id() {
        let entries = parse_entries(SAMPLE_RSS, &feed()).unwrap();

        assert_eq!(entries[1].id, "https://www.codeur.com/projects/100");
        assert_eq!(
            entries[1].link.as_deref(),
            Some("https://www.codeur.com/projects/100-application-mobile")
        );
        assert_eq!(entries[1].feed_name, "Codeur - Dev");
    }

    #[test]
    fn test_parse_entries_ids_are_stable_across_fetches() {
        let first = parse_entries(SAMPLE_RSS, &feed()).unwrap();
        let second = parse_entries(SAMPLE_RSS, &feed()).unwrap();

        let ids = |e: &[Entry]| e.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    fn guidless_item(title: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Codeur.com</title>
    <item>
      <title>{}</title>
      <link>https://www.codeur.com/projects/42</link>
      <pubDate>Mon, 15 Jan 2024 08:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#,
            title
        )
    }

    #[test]
    fn test_parse_entries_falls_back_to_link_when_guid_missing() {
        let before = parse_entries(guidless_item("Refonte site").as_bytes(), &feed()).unwrap();
        let after =
            parse_entries(guidless_item("Refonte site (urgent)").as_bytes(), &feed()).unwrap();

        assert_eq!(before[0].id, "https://www.codeur.com/projects/42");
        assert_eq!(after[0].id, before[0].id);
    }

    #[test]
    fn test_parse_entries_skips_items_without_guid_or_link() {
        let entries = parse_entries(SAMPLE_RSS, &feed()).unwrap();
        assert!(entries.iter().all(|e| !e.id.is_empty()));
        assert!(entries.iter().all(|e| e.link.is_some()));
    }

    #[test]
    fn test_parse_entries_extracts_listing_details() {
        let entries = parse_entries(SAMPLE_RSS, &feed()).unwrap();
        let mobile = &entries[1];

        assert_eq!(mobile.budget.as_deref(), Some("1 000 € à 10 000 €"));
        assert_eq!(mobile.categories, vec!["Mobile", "Application mobile", "iOS"]);
        assert_eq!(mobile.description, "Nous voulons une application.");
        assert!(mobile.published.is_some());
    }

    #[test]
    fn test_parse_entries_rejects_malformed_body() {
        let result = parse_entries(b"<html><body>not a feed", &feed());
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_parse_entries_enforces_configured_format() {
        let rss_only = FeedConfig {
            format: FeedFormat::Rss,
            ..feed()
        };
        let result = parse_entries(SAMPLE_ATOM, &rss_only);
        assert!(matches!(result, Err(FetchError::FormatMismatch { .. })));

        let atom = FeedConfig {
            format: FeedFormat::Atom,
            ..feed()
        };
        let entries = parse_entries(SAMPLE_ATOM, &atom).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "https://example.com/posts/1");
    }

    fn fetcher() -> HttpFeedFetcher {
        HttpFeedFetcher::new(Duration::from_secs(5), "feedhook-test/1.0")
    }

    #[test]
    fn test_fetch_parses_served_feed_with_user_agent() {
        let server = StubServer::start(vec![Reply::status(200)
            .with_header("Content-Type", "application/rss+xml; charset=utf-8")
            .with_body(std::str::from_utf8(SAMPLE_RSS).unwrap())]);
        let feed = FeedConfig::new("Codeur - Dev", server.url("/projects.rss"));

        let entries = fetcher().fetch(&feed).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Site vitrine");
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].head.starts_with("GET /projects.rss "));
        assert_eq!(requests[0].header("user-agent"), Some("feedhook-test/1.0"));
    }

    #[test]
    fn test_fetch_maps_error_status() {
        let server = StubServer::start(vec![Reply::status(503).with_body("maintenance")]);
        let feed = FeedConfig::new("Codeur - Dev", server.url("/projects.rss"));

        let result = fetcher().fetch(&feed);

        assert!(matches!(result, Err(FetchError::Status(503))));
    }

    #[test]
    fn test_fetch_reports_unparseable_body() {
        let server = StubServer::start(vec![Reply::status(200).with_body("<html>maintenance</html>")]);
        let feed = FeedConfig::new("Codeur - Dev", server.url("/projects.rss"));

        assert!(matches!(fetcher().fetch(&feed), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_fetch_reports_connection_failure() {
        let feed = FeedConfig::new("Codeur - Dev", unreachable_url("/projects.rss"));

        assert!(matches!(fetcher().fetch(&feed), Err(FetchError::Request(_))));
    }
}
