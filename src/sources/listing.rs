//! Listing details embedded in marketplace item descriptions.
//!
//! Job feeds put a metadata line such as
//! `Budget : Moins de 500 € - Catégories : Développement spécifique, API`
//! before the project text, and close with a "Voir ce projet sur …" trailer.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static BUDGET_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)budget\s*:\s*(?P<budget>.+?)\s+-\s+cat[ée]gories?\s*:\s*(?P<categories>.+)$")
        .expect("budget pattern is valid")
});

static TRAILER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^voir ce projet sur").expect("trailer pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetails {
    pub budget: Option<String>,
    pub categories: Vec<String>,
    pub excerpt: String,
}

/// Extract plain text from HTML, one line per block element
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            text.push_str(text_node);
        }
        if let Some(element) = node.value().as_element() {
            match element.name() {
                "p" | "br" | "div" | "li" | "h1" | "h2" | "h3" | "h4" => text.push('\n'),
                _ => {}
            }
        }
    }

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split description text into budget, categories and the remaining excerpt
pub fn parse_listing(text: &str) -> ListingDetails {
    let mut details = ListingDetails::default();
    let mut body = Vec::new();

    for line in text.lines() {
        let line = line.trim();

        if TRAILER_LINE.is_match(line) {
            break;
        }

        if details.budget.is_none() {
            if let Some(caps) = BUDGET_LINE.captures(line) {
                details.budget = Some(caps["budget"].trim().to_string());
                details.categories = split_categories(&caps["categories"]);
                continue;
            }
        }

        if !line.is_empty() {
            body.push(line);
        }
    }

    details.excerpt = body
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    details
}

fn split_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().trim_end_matches('.').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Merge feed-level categories with the ones found in the description
pub fn merge_categories(mut from_feed: Vec<String>, from_text: Vec<String>) -> Vec<String> {
    for category in from_text {
        if !from_feed.iter().any(|c| c.eq_ignore_ascii_case(&category)) {
            from_feed.push(category);
        }
    }
    from_feed
}
