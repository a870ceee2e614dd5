//! HTTP scrape client for the product catalog.
//!
//! ### Behavior
//!
//! - Search: `{base_url}/s?k=<query>&page=<n>`, parsed into result records.
//! - Details: the product page itself, parsed into a single record with the
//!   catalog id taken from the `/dp/<id>` URL segment.
//! - User-Agent rotates round-robin across the configured strings.
//! - Any HTTP or parse failure logs a warning and yields empty data; the
//!   engine treats that as "no data", never as an error.

pub mod parse;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mandi_core::{CatalogFetcher, RawProduct};
use reqwest::{Client, header};
use url::Url;

/// Configuration for the scrape client.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Catalog site root (default: "https://www.amazon.in").
    pub base_url: String,

    /// User-Agent strings rotated per request.
    pub user_agents: Vec<String>,

    /// Request timeout (default: 30s).
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5).
    pub max_redirects: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.in".to_string(),
            user_agents: vec!["mandi/0.1".to_string()],
            timeout: Duration::from_millis(30_000),
            max_redirects: 5,
        }
    }
}

/// Errors constructing the scrape client.
///
/// Once built, the client never errors: fetch failures degrade to empty
/// results.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("invalid base URL: {0}")]
    BaseUrl(String),
}

/// Catalog scrape client.
pub struct ScrapeClient {
    http: Client,
    config: ScrapeConfig,
    next_agent: AtomicUsize,
}

impl ScrapeClient {
    /// Create a new scrape client with the given configuration.
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        Url::parse(&config.base_url).map_err(|e| ScrapeError::BaseUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ScrapeError::ClientBuild(e.to_string()))?;

        Ok(Self { http, config, next_agent: AtomicUsize::new(0) })
    }

    fn user_agent(&self) -> &str {
        let idx = self.next_agent.fetch_add(1, Ordering::Relaxed);
        &self.config.user_agents[idx % self.config.user_agents.len()]
    }

    fn search_url(&self, query: &str, page: u32) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.config.base_url)?.join("/s")?;
        url.query_pairs_mut()
            .append_pair("k", query)
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// Fetch a page as text. `None` on any transport or status failure.
    async fn get_html(&self, url: &str) -> Option<String> {
        let response = self
            .http
            .get(url)
            .header(header::USER_AGENT, self.user_agent())
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("fetch failed for {url}: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("fetch for {url} returned status {}", response.status().as_u16());
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("failed to read body for {url}: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl CatalogFetcher for ScrapeClient {
    async fn search(&self, query: &str, page: u32) -> Vec<RawProduct> {
        let url = match self.search_url(query, page) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("could not build search URL for {query:?}: {e}");
                return Vec::new();
            }
        };

        tracing::debug!("searching catalog: {url}");
        match self.get_html(url.as_str()).await {
            Some(html) => parse::search_results(&html, &self.config.base_url),
            None => Vec::new(),
        }
    }

    async fn details(&self, url: &str) -> Option<RawProduct> {
        tracing::debug!("fetching details: {url}");
        let html = self.get_html(url).await?;
        parse::product_details(&html, url)
    }
}
