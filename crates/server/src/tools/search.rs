//! search_product, batch_search and search_by_category implementations.
//!
//! search_product is the cache-first path: a non-empty set of stored title
//! matches is served as-is, however stale — freshness on this path is a
//! deliberate trade-off and only the explicit refresh operation addresses
//! it. batch_search and search_by_category go straight to the catalog and
//! write nothing.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mandi_core::{CatalogFetcher, Error, RawProduct, Store};

/// Input parameters for search_product tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchProductParams {
    /// Product name or keywords (required).
    pub query: String,

    /// Max results (default: 10).
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

fn default_search_limit() -> u32 {
    10
}

/// Input parameters for batch_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BatchSearchParams {
    /// Queries to run, one catalog search each.
    pub queries: Vec<String>,
}

/// Per-query slice of a batch search result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchSearchEntry {
    pub query: String,
    pub results: Vec<RawProduct>,
}

/// Input parameters for search_by_category tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchByCategoryParams {
    /// Category name, used as the search query (required).
    pub category: String,

    /// Max results (default: 10).
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

/// Top results kept per query in a batch search.
const BATCH_TOP_N: usize = 3;

/// Implementation of the search_product tool.
pub async fn search_product_impl(
    db: &Store, fetcher: &dyn CatalogFetcher, params: SearchProductParams,
) -> Result<CallToolResult, McpError> {
    if params.query.is_empty() {
        return Err(Error::InvalidInput("query cannot be empty".into()).into());
    }

    let log_id = db.log_search_start(&params.query).await?;

    let cached = db.search_by_title(&params.query, params.limit).await?;
    if !cached.is_empty() {
        tracing::debug!("cache hit for search query: {}", params.query);
        return Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&cached).unwrap_or_default(),
        )]));
    }

    let mut fetched = fetcher.search(&params.query, 1).await;
    fetched.truncate(params.limit as usize);

    db.merge_search_results(&fetched).await?;
    db.log_search_result(log_id, fetched.len() as u32).await?;

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&fetched).unwrap_or_default(),
    )]))
}

/// Implementation of the batch_search tool.
///
/// Each query gets a direct catalog search capped to the top few results;
/// nothing is persisted.
pub async fn batch_search_impl(
    fetcher: &dyn CatalogFetcher, params: BatchSearchParams,
) -> Result<CallToolResult, McpError> {
    if params.queries.is_empty() {
        return Err(Error::InvalidInput("queries cannot be empty".into()).into());
    }

    let mut entries = Vec::with_capacity(params.queries.len());
    for query in &params.queries {
        let mut results = fetcher.search(query, 1).await;
        results.truncate(BATCH_TOP_N);
        entries.push(BatchSearchEntry { query: query.clone(), results });
    }

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&entries).unwrap_or_default(),
    )]))
}

/// Implementation of the search_by_category tool.
///
/// The catalog has no category endpoint worth scraping; the category name
/// itself is the search query. Results are not persisted.
pub async fn search_by_category_impl(
    fetcher: &dyn CatalogFetcher, params: SearchByCategoryParams,
) -> Result<CallToolResult, McpError> {
    if params.category.is_empty() {
        return Err(Error::InvalidInput("category cannot be empty".into()).into());
    }

    let mut fetched = fetcher.search(&params.category, 1).await;
    fetched.truncate(params.limit as usize);

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&fetched).unwrap_or_default(),
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubCatalog, raw, result_json};

    #[tokio::test]
    async fn test_empty_query() {
        let db = Store::open_in_memory().await.unwrap();
        let fetcher = StubCatalog::default();
        let params = SearchProductParams { query: "".into(), ..Default::default() };

        let result = search_product_impl(&db, &fetcher, params).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_and_merges() {
        let db = Store::open_in_memory().await.unwrap();
        let fetcher = StubCatalog::default().with_search(
            "mouse",
            vec![
                raw(Some("A1"), "Wireless Mouse", Some("₹999")),
                raw(None, "Sponsored Mouse", Some("₹1")),
            ],
        );

        let params = SearchProductParams { query: "mouse".into(), limit: 10 };
        let result = search_product_impl(&db, &fetcher, params).await.unwrap();

        let json = result_json(&result);
        assert_eq!(json.as_array().unwrap().len(), 2);

        // only the id-bearing record is cached, with its first price sample
        assert!(db.product_by_id("A1").await.unwrap().is_some());
        assert_eq!(db.price_history("A1").await.unwrap().len(), 1);
        assert_eq!(db.stats().await.unwrap().total_products, 1);

        let history = db.search_history(10).await.unwrap();
        assert_eq!(history[0].results_count, 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Wireless Mouse", Some("₹999"))])
            .await
            .unwrap();

        // the stub would return a different record; the cached row wins
        let fetcher =
            StubCatalog::default().with_search("Wireless", vec![raw(Some("A2"), "Wireless Trackball", None)]);

        let params = SearchProductParams { query: "Wireless".into(), limit: 10 };
        let result = search_product_impl(&db, &fetcher, params).await.unwrap();

        let json = result_json(&result);
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["id"], "A1");
        assert!(db.product_by_id("A2").await.unwrap().is_none());

        // the log row stays at zero on the cached path
        let history = db.search_history(10).await.unwrap();
        assert_eq!(history[0].results_count, 0);
    }

    #[tokio::test]
    async fn test_limit_caps_results() {
        let db = Store::open_in_memory().await.unwrap();
        let fetcher = StubCatalog::default().with_search(
            "mouse",
            vec![
                raw(Some("A1"), "Mouse One", None),
                raw(Some("A2"), "Mouse Two", None),
                raw(Some("A3"), "Mouse Three", None),
            ],
        );

        let params = SearchProductParams { query: "mouse".into(), limit: 2 };
        let result = search_product_impl(&db, &fetcher, params).await.unwrap();

        let json = result_json(&result);
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(db.stats().await.unwrap().total_products, 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_empty_result() {
        let db = Store::open_in_memory().await.unwrap();
        let fetcher = StubCatalog::default();

        let params = SearchProductParams { query: "unknown".into(), limit: 5 };
        let result = search_product_impl(&db, &fetcher, params).await.unwrap();

        let json = result_json(&result);
        assert!(json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_search_top_three() {
        let db = Store::open_in_memory().await.unwrap();
        let fetcher = StubCatalog::default().with_search(
            "mouse",
            vec![
                raw(Some("A1"), "Mouse One", None),
                raw(Some("A2"), "Mouse Two", None),
                raw(Some("A3"), "Mouse Three", None),
                raw(Some("A4"), "Mouse Four", None),
            ],
        );

        let params = BatchSearchParams { queries: vec!["mouse".into(), "missing".into()] };
        let result = batch_search_impl(&fetcher, params).await.unwrap();

        let json = result_json(&result);
        assert_eq!(json[0]["query"], "mouse");
        assert_eq!(json[0]["results"].as_array().unwrap().len(), 3);
        assert!(json[1]["results"].as_array().unwrap().is_empty());

        // batch search never writes
        assert_eq!(db.stats().await.unwrap().total_products, 0);
    }

    #[tokio::test]
    async fn test_search_by_category_truncates_and_skips_store() {
        let db = Store::open_in_memory().await.unwrap();
        let fetcher = StubCatalog::default().with_search(
            "Electronics",
            vec![raw(Some("A1"), "Earbuds", None), raw(Some("A2"), "Charger", None)],
        );

        let params = SearchByCategoryParams { category: "Electronics".into(), limit: 1 };
        let result = search_by_category_impl(&fetcher, params).await.unwrap();

        let json = result_json(&result);
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(db.stats().await.unwrap().total_products, 0);
    }
}
