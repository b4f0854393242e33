//! Wires the web fetch tool family into a [`Module`]: `fetch_url`,
//! `fetch_multiple_urls`, `extract_links`, and `analyze_webpage`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::errors::{DomainError, HandlerError, ResourceError};
use crate::module::Module;
use crate::registry::Tool;
use crate::response::Envelope;
use crate::web::analyze::{self, AnalysisSections};
use crate::web::fetcher::{self, FetchOptions, MultiFetchOptions};
use crate::web::links::{self, LinkOptions};
use crate::web::schemas;

fn required_str(args: &Value, field: &str) -> Result<String, HandlerError> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DomainError(format!("{field} is required")).into())
}

fn parse_url(raw: &str) -> Result<Url, HandlerError> {
    Url::parse(raw).map_err(|e| DomainError(format!("invalid url: {e}")).into())
}

pub struct WebModule {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl WebModule {
    pub fn new(config: Arc<Config>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.web_connection_timeout_ms))
            .timeout(Duration::from_millis(config.web_read_timeout_ms))
            .user_agent(config.web_user_agent.clone())
            .build()
            .expect("default web client configuration is always valid");
        Self { client, config }
    }
}

#[async_trait]
impl Module for WebModule {
    fn name(&self) -> &str {
        "web"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn description(&self) -> Option<&str> {
        Some("Bounded-concurrency HTTP fetching, link extraction, and page analysis")
    }

    fn tools(&self) -> Vec<Tool> {
        let config = self.config.clone();
        let client = self.client.clone();

        vec![
            {
                let config = config.clone();
                Tool::new("fetch_url", "Fetch one URL and return its text content", schemas::fetch_url(), move |args| {
                    let config = config.clone();
                    async move {
                        let url = required_str(&args, "url")?;
                        let options = FetchOptions::from_value(&args);
                        let body = fetcher::fetch_url(&url, &options, &config.web_user_agent).await?;
                        Ok(Envelope::text(body))
                    }
                })
            },
            {
                let config = config.clone();
                Tool::new(
                    "fetch_multiple_urls",
                    "Fetch up to 10 URLs concurrently and summarise results",
                    schemas::fetch_multiple_urls(),
                    move |args| {
                        let config = config.clone();
                        async move {
                            let urls: Vec<String> = args
                                .get("urls")
                                .and_then(Value::as_array)
                                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                                .unwrap_or_default();
                            let multi: MultiFetchOptions =
                                args.get("options").cloned().map(serde_json::from_value).and_then(Result::ok).unwrap_or_default();
                            let report = fetcher::fetch_multiple_urls(&urls, &multi, &config.web_user_agent).await?;
                            Ok(Envelope::text(report))
                        }
                    },
                )
            },
            {
                let client = client.clone();
                Tool::new("extract_links", "Extract and filter links from a page", schemas::extract_links(), move |args| {
                    let client = client.clone();
                    async move {
                        let raw_url = required_str(&args, "url")?;
                        let page_url = parse_url(&raw_url)?;
                        let options: LinkOptions =
                            args.get("options").cloned().map(serde_json::from_value).and_then(Result::ok).unwrap_or_default();

                        let response = client.get(page_url.clone()).send().await.map_err(|e| ResourceError(e.to_string()))?;
                        if !response.status().is_success() {
                            return Err(HandlerError::from(ResourceError(format!("HTTP {}: request failed", response.status().as_u16()))));
                        }
                        let html = response.text().await.map_err(|e| ResourceError(e.to_string()))?;

                        let links = links::extract_links(&page_url, &html, &options)?;
                        Ok(Envelope::text(links::render(&links, options.include_text)))
                    }
                })
            },
            {
                let client = client.clone();
                Tool::new("analyze_webpage", "Report metadata, structure, images, and fetch performance", schemas::analyze_webpage(), move |args| {
                    let client = client.clone();
                    async move {
                        let raw_url = required_str(&args, "url")?;
                        let page_url = parse_url(&raw_url)?;
                        let sections: AnalysisSections =
                            args.get("sections").cloned().map(serde_json::from_value).and_then(Result::ok).unwrap_or_default();

                        let page = analyze::fetch_page(&client, raw_url.as_str()).await?;
                        Ok(Envelope::text(analyze::analyze(&page_url, &page, &sections)))
                    }
                })
            },
        ]
    }
}
