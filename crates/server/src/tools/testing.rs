//! Deterministic fetch double for tool tests.

use async_trait::async_trait;
use mandi_core::{CatalogFetcher, RawProduct};
use std::collections::HashMap;

/// Canned catalog data keyed by query (for search) and URL (for details).
/// Anything not configured comes back empty, like a failed scrape.
#[derive(Debug, Default)]
pub struct StubCatalog {
    pub search_results: HashMap<String, Vec<RawProduct>>,
    pub detail_pages: HashMap<String, RawProduct>,
}

impl StubCatalog {
    pub fn with_search(mut self, query: &str, results: Vec<RawProduct>) -> Self {
        self.search_results.insert(query.to_string(), results);
        self
    }

    pub fn with_details(mut self, url: &str, product: RawProduct) -> Self {
        self.detail_pages.insert(url.to_string(), product);
        self
    }
}

#[async_trait]
impl CatalogFetcher for StubCatalog {
    async fn search(&self, query: &str, _page: u32) -> Vec<RawProduct> {
        self.search_results.get(query).cloned().unwrap_or_default()
    }

    async fn details(&self, url: &str) -> Option<RawProduct> {
        self.detail_pages.get(url).cloned()
    }
}

/// A fetched record as the scrape client would shape it.
pub fn raw(id: Option<&str>, title: &str, price: Option<&str>) -> RawProduct {
    RawProduct {
        id: id.map(str::to_string),
        title: title.to_string(),
        url: format!("https://catalog.example/dp/{}", id.unwrap_or("unlisted")),
        price: price.map(str::to_string),
        rating: Some("4.3".to_string()),
        reviews_count: Some("1,204".to_string()),
        image_url: None,
        category: None,
        availability: None,
        description: None,
    }
}

/// Pull the JSON text out of a tool result.
pub fn result_json(result: &rmcp::model::CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).expect("content serializes");
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("expected text content");
    serde_json::from_str(text).unwrap_or(serde_json::Value::String(text.to_string()))
}
