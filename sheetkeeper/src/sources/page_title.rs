//! Page Title Source
//!
//! Fetches a URL and returns the HTML document's `<title>`.
//!
//! # Behavior
//! - One GET per lookup, with a crawler User-Agent
//! - The response status is **not** inspected: an error page that renders a
//!   title yields that title
//! - Known block-page titles are treated as "no title"
//! - No request timeout is set; the transport's own behavior applies

use crate::types::{MetadataSource, SourceError, VideoMetadata};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use sheetkeeper_common::{Error, Result};
use tracing::debug;

/// User-Agent sent with every page fetch
const USER_AGENT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// Titles served by bot-blocking pages
const BLOCKED_TITLES: &[&str] = &["Blocked", "Attention Required! | Cloudflare"];

/// Generic page title source
pub struct PageTitleSource {
    http_client: Client,
}

impl PageTitleSource {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Extract the document title from HTML.
    ///
    /// Returns `None` for a missing or empty title and for block-page titles.
    pub fn extract_title(html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("title").ok()?;

        let title = document
            .select(&selector)
            .next()?
            .text()
            .collect::<String>()
            .trim()
            .to_string();

        if title.is_empty() || BLOCKED_TITLES.contains(&title.as_str()) {
            None
        } else {
            Some(title)
        }
    }
}

#[async_trait]
impl MetadataSource for PageTitleSource {
    fn name(&self) -> &'static str {
        "page-title"
    }

    async fn lookup(&self, url: &str) -> std::result::Result<Option<VideoMetadata>, SourceError> {
        debug!(url = %url, "Fetching page title");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Connectivity(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Connectivity(format!("Reading {} failed: {}", url, e)))?;

        let title = Self::extract_title(&body);
        debug!(url = %url, status = %status, title = ?title, "Page title lookup complete");

        Ok(title.map(VideoMetadata::with_title))
    }
}
