//! Lightweight page analysis: metadata, structural counts, image
//! inventory, and fetch performance, each reported independently.

use std::time::{Duration, Instant};

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::errors::ResourceError;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSections {
    #[serde(default = "default_true")]
    pub metadata: bool,
    #[serde(default = "default_true")]
    pub structure: bool,
    #[serde(default = "default_true")]
    pub images: bool,
    #[serde(default = "default_true")]
    pub performance: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisSections {
    fn default() -> Self {
        Self { metadata: true, structure: true, images: true, performance: true }
    }
}

pub struct FetchedPage {
    pub html: String,
    pub duration: Duration,
}

pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<FetchedPage, ResourceError> {
    let start = Instant::now();
    let response = client.get(url).send().await.map_err(|e| ResourceError(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ResourceError(format!("HTTP {}: {}", response.status().as_u16(), response.status().canonical_reason().unwrap_or("Unknown"))));
    }
    let html = response.text().await.map_err(|e| ResourceError(e.to_string()))?;
    Ok(FetchedPage { html, duration: start.elapsed() })
}

/// Render the requested subset of `{metadata, structure, images,
/// performance}` sections as one text report.
pub fn analyze(page_url: &Url, page: &FetchedPage, sections: &AnalysisSections) -> String {
    let document = Html::parse_document(&page.html);
    let mut report = String::new();

    if sections.metadata {
        report.push_str(&render_metadata(&document));
    }
    if sections.structure {
        report.push_str(&render_structure(&document));
    }
    if sections.images {
        report.push_str(&render_images(&document, page_url));
    }
    if sections.performance {
        report.push_str(&render_performance(page));
    }
    report
}

fn text_of(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next().map(|el| el.text().collect::<Vec<_>>().join("").trim().to_string())
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
    document.select(&selector).next().and_then(|el| el.value().attr("content")).map(str::to_string)
}

fn render_metadata(document: &Html) -> String {
    let mut out = String::from("Metadata:\n");
    out.push_str(&format!("  Title: {}\n", text_of(document, "title").unwrap_or_default()));
    if let Some(description) = meta_content(document, "description") {
        out.push_str(&format!("  Description: {description}\n"));
    }
    if let Some(keywords) = meta_content(document, "keywords") {
        out.push_str(&format!("  Keywords: {keywords}\n"));
    }
    out.push('\n');
    out
}

fn count(document: &Html, selector: &str) -> usize {
    Selector::parse(selector).map(|s| document.select(&s).count()).unwrap_or(0)
}

fn render_structure(document: &Html) -> String {
    let mut out = String::from("Structure:\n");
    out.push_str(&format!("  h1: {}\n", count(document, "h1")));
    out.push_str(&format!("  h2: {}\n", count(document, "h2")));
    out.push_str(&format!("  h3: {}\n", count(document, "h3")));
    out.push_str(&format!("  p: {}\n", count(document, "p")));
    out.push_str(&format!("  a[href]: {}\n", count(document, "a[href]")));

    if let Some(h1) = text_of(document, "h1") {
        out.push_str(&format!("  First H1: {h1}\n"));
    }
    if let Ok(selector) = Selector::parse("h2") {
        let headings: Vec<String> =
            document.select(&selector).take(5).map(|el| el.text().collect::<Vec<_>>().join("").trim().to_string()).collect();
        if !headings.is_empty() {
            out.push_str(&format!("  H2s: {}\n", headings.join(" | ")));
        }
    }
    out.push('\n');
    out
}

fn render_images(document: &Html, page_url: &Url) -> String {
    let mut out = String::from("Images:\n");
    let Ok(selector) = Selector::parse("img") else { return out };
    for element in document.select(&selector).take(20) {
        let Some(src) = element.value().attr("src") else { continue };
        let Ok(resolved) = page_url.join(src) else { continue };
        let alt = element.value().attr("alt").unwrap_or("");
        out.push_str(&format!("  {resolved} (alt: {alt})\n"));
    }
    out.push('\n');
    out
}

fn render_performance(page: &FetchedPage) -> String {
    format!("Performance:\n  Fetch duration: {} ms\n  HTML length: {} bytes\n", page.duration.as_millis(), page.html.len())
}
