//! Single and multi-URL fetching: GET, status/content-type gating,
//! HTML-to-text extraction, and length truncation.

use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{DomainError, ResourceError};

const TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";
const SUPPORTED_CONTENT_TYPES: [&str; 3] = ["text/html", "text/plain", "application/json"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOptions {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    #[serde(default)]
    pub include_headers: bool,
    #[serde(default = "default_true")]
    pub text_only: bool,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_timeout_ms() -> u64 {
    10_000
}
fn default_true() -> bool {
    true
}
fn default_max_length() -> usize {
    50_000
}

impl FetchOptions {
    pub fn from_value(value: &Value) -> Self {
        value
            .get("options")
            .cloned()
            .map(serde_json::from_value)
            .and_then(Result::ok)
            .unwrap_or_else(|| serde_json::from_value(serde_json::json!({})).unwrap())
    }
}

fn content_type_is_supported(content_type: &str) -> bool {
    SUPPORTED_CONTENT_TYPES.iter().any(|t| content_type.contains(t))
}

/// Strip `<script>`/`<style>` subtrees and return the remaining visible
/// text, whitespace-collapsed.
pub fn html_to_text(body: &str) -> String {
    let document = Html::parse_document(body);
    let excluded = Selector::parse("script, style").unwrap();
    let excluded_texts: std::collections::HashSet<_> = document
        .select(&excluded)
        .flat_map(|el| el.text().collect::<Vec<_>>())
        .collect();

    let all_text = document.root_element().text().collect::<Vec<_>>();
    let visible: Vec<&str> = all_text.into_iter().filter(|t| !excluded_texts.contains(t)).collect();
    visible.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(body: String, max_length: usize) -> String {
    if body.chars().count() <= max_length {
        return body;
    }
    let truncated: String = body.chars().take(max_length).collect();
    format!("{truncated}{TRUNCATION_MARKER}")
}

fn build_client(timeout: Duration, user_agent: &str, follow_redirects: bool) -> reqwest::Result<Client> {
    let redirect_policy = if follow_redirects { reqwest::redirect::Policy::limited(10) } else { reqwest::redirect::Policy::none() };
    Client::builder().timeout(timeout).user_agent(user_agent).redirect(redirect_policy).build()
}

/// Fetch one URL and render the report text described by the fetch tool's
/// contract: a header block, optional raw headers, then the (possibly
/// text-extracted and truncated) body.
pub async fn fetch_url(url: &str, options: &FetchOptions, default_user_agent: &str) -> Result<String, ResourceError> {
    let user_agent = options.user_agent.as_deref().unwrap_or(default_user_agent);
    let client = build_client(Duration::from_millis(options.timeout_ms), user_agent, options.follow_redirects)
        .map_err(|e| ResourceError(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| ResourceError(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ResourceError(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type_is_supported(&content_type) {
        return Err(ResourceError(format!("Unsupported content type: {content_type}")));
    }

    let headers_block = if options.include_headers {
        let mut block = String::from("Headers:\n");
        for (name, value) in response.headers() {
            block.push_str(&format!("  {}: {}\n", name, value.to_str().unwrap_or("")));
        }
        block
    } else {
        String::new()
    };

    let body = response.text().await.map_err(|e| ResourceError(e.to_string()))?;
    let is_html = content_type.contains("text/html");
    let content = if options.text_only && is_html { html_to_text(&body) } else { body };
    let reported_length = content.chars().count().min(options.max_length);
    let truncated = truncate(content, options.max_length);

    Ok(format!(
        "URL: {url}\nStatus: {} {}\nContent-Type: {content_type}\nContent Length: {reported_length} characters\n{headers_block}Content:\n{truncated}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
    ))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MultiFetchOptions {
    #[serde(default)]
    pub include_failures: bool,
}

pub struct FetchOutcome {
    pub url: String,
    pub success: bool,
    pub body: Option<String>,
    pub error: Option<String>,
}

const MAX_BATCH_URLS: usize = 10;

/// Fetch every URL concurrently (never sequentially), aggregate in input
/// order, and render the combined report.
pub async fn fetch_multiple_urls(urls: &[String], multi: &MultiFetchOptions, default_user_agent: &str) -> Result<String, DomainError> {
    if urls.len() > MAX_BATCH_URLS {
        return Err(DomainError(format!("Cannot fetch more than {MAX_BATCH_URLS} URLs at once (got {})", urls.len())));
    }

    let fixed_options = FetchOptions {
        timeout_ms: default_timeout_ms(),
        user_agent: Some(default_user_agent.to_string()),
        follow_redirects: true,
        include_headers: false,
        text_only: true,
        max_length: default_max_length(),
    };

    let fetches = urls.iter().map(|url| {
        let options = fixed_options.clone();
        let url = url.clone();
        let default_user_agent = default_user_agent.to_string();
        async move {
            match fetch_url(&url, &options, &default_user_agent).await {
                Ok(body) => FetchOutcome { url, success: true, body: Some(body), error: None },
                Err(e) => FetchOutcome { url, success: false, body: None, error: Some(e.0) },
            }
        }
    });

    let outcomes = join_all(fetches).await;
    let succeeded = outcomes.iter().filter(|o| o.success).count();

    let mut report = String::new();
    for outcome in &outcomes {
        if outcome.success {
            report.push_str(outcome.body.as_deref().unwrap_or(""));
            report.push_str("\n\n");
        } else if multi.include_failures {
            report.push_str(&format!("URL: {}\nFailed: {}\n\n", outcome.url, outcome.error.as_deref().unwrap_or("unknown error")));
        }
    }
    report.push_str(&format!("Summary: {succeeded}/{} URLs fetched successfully", outcomes.len()));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_appends_marker_only_when_exceeded() {
        let short = truncate("hello".to_string(), 10);
        assert_eq!(short, "hello");
        let long = truncate("x".repeat(20), 10);
        assert!(long.starts_with(&"x".repeat(10)));
        assert!(long.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn html_to_text_strips_script_and_style() {
        let html = "<html><body><p>hello</p><script>evil()</script><style>.a{}</style></body></html>";
        let text = html_to_text(html);
        assert!(text.contains("hello"));
        assert!(!text.contains("evil"));
    }

    #[test]
    fn content_type_allow_list_matches_substrings() {
        assert!(content_type_is_supported("text/html; charset=utf-8"));
        assert!(content_type_is_supported("application/json"));
        assert!(!content_type_is_supported("image/png"));
    }
}
