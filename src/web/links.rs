//! Link extraction: parse fetched HTML, resolve anchors to absolute URLs,
//! and filter/dedupe/truncate per the caller's options.

use std::collections::HashSet;

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::errors::ResourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkFilter {
    All,
    Internal,
    External,
}

impl Default for LinkFilter {
    fn default() -> Self {
        LinkFilter::All
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOptions {
    #[serde(default)]
    pub filter: LinkFilter,
    #[serde(default = "default_true")]
    pub include_text: bool,
    #[serde(default = "default_true")]
    pub unique: bool,
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

fn default_true() -> bool {
    true
}
fn default_max_links() -> usize {
    100
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self { filter: LinkFilter::All, include_text: true, unique: true, max_links: default_max_links() }
    }
}

pub struct Link {
    pub url: Url,
    pub text: String,
}

/// Parse `html` (fetched from `page_url`), resolve every `<a href>` to an
/// absolute URL, and apply the host filter, dedup, and cap.
pub fn extract_links(page_url: &Url, html: &str, options: &LinkOptions) -> Result<Vec<Link>, ResourceError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").map_err(|e| ResourceError(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else { continue };
        let Ok(resolved) = page_url.join(href) else { continue };

        if !matches_filter(page_url, &resolved, options.filter) {
            continue;
        }
        if options.unique && !seen.insert(resolved.to_string()) {
            continue;
        }

        let text = element.text().collect::<Vec<_>>().join("").trim().to_string();
        let text = if text.is_empty() { "[No text]".to_string() } else { text };

        links.push(Link { url: resolved, text });
        if links.len() >= options.max_links {
            break;
        }
    }

    Ok(links)
}

fn matches_filter(page_url: &Url, link_url: &Url, filter: LinkFilter) -> bool {
    match filter {
        LinkFilter::All => true,
        LinkFilter::Internal => link_url.host_str() == page_url.host_str(),
        LinkFilter::External => link_url.host_str() != page_url.host_str(),
    }
}

/// Render as the numbered report text the tool returns.
pub fn render(links: &[Link], include_text: bool) -> String {
    if links.is_empty() {
        return "No links found.".to_string();
    }
    links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            if include_text {
                format!("{}. {} ({})", i + 1, link.url, link.text)
            } else {
                format!("{}. {}", i + 1, link.url)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_filter_keeps_only_same_host_links() {
        let page = Url::parse("https://example.com/a").unwrap();
        let html = r#"<a href="/b">home</a><a href="https://other.com/c">away</a>"#;
        let links = extract_links(&page, html, &LinkOptions { filter: LinkFilter::Internal, ..Default::default() }).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url.host_str(), Some("example.com"));
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let page = Url::parse("https://example.com/a").unwrap();
        let html = r#"<a href="/b">first</a><a href="/b">second</a>"#;
        let links = extract_links(&page, html, &LinkOptions::default()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text, "first");
    }

    #[test]
    fn blank_anchor_text_defaults_to_placeholder() {
        let page = Url::parse("https://example.com/a").unwrap();
        let html = r#"<a href="/b"></a>"#;
        let links = extract_links(&page, html, &LinkOptions::default()).unwrap();
        assert_eq!(links[0].text, "[No text]");
    }
}
