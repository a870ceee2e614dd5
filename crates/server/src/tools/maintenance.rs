//! refresh_cache, clear_cache, export_data and get_cache_stats.
//!
//! The bulk paths degrade per item and never retry: a candidate whose
//! detail fetch fails is skipped and the remaining merges still commit.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mandi_core::{CatalogFetcher, Error, ProductPatch, Store};

/// Input parameters for refresh_cache tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RefreshCacheParams {
    /// Max records to refresh, stalest first (default: 10).
    #[serde(default = "default_refresh_limit")]
    pub limit: u32,
}

impl Default for RefreshCacheParams {
    fn default() -> Self {
        Self { limit: default_refresh_limit() }
    }
}

fn default_refresh_limit() -> u32 {
    10
}

/// Output from the refresh_cache tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RefreshCacheOutput {
    /// Records whose fetched fields were merged back.
    pub refreshed: usize,
    /// Records selected for refresh.
    pub candidates: usize,
}

/// Input parameters for clear_cache tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ClearCacheParams {
    /// Must be true for the clear to run.
    #[serde(default)]
    pub confirm: bool,
}

/// Input parameters for export_data tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportDataParams {
    /// Destination file (default: mandi_export.json).
    #[serde(default = "default_export_filename")]
    pub filename: String,
}

impl Default for ExportDataParams {
    fn default() -> Self {
        Self { filename: default_export_filename() }
    }
}

fn default_export_filename() -> String {
    "mandi_export.json".into()
}

/// Output from the export_data tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportDataOutput {
    pub path: String,
    pub exported: usize,
}

/// Input parameters for get_cache_stats tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsParams {}

/// Implementation of the refresh_cache tool.
///
/// Selects the records whose data has gone longest without an update,
/// re-fetches each detail page, and commits every successful merge (plus
/// its price sample, changed or not) in one transaction at the end.
pub async fn refresh_cache_impl(
    db: &Store, fetcher: &dyn CatalogFetcher, params: RefreshCacheParams,
) -> Result<CallToolResult, McpError> {
    let candidates = db.stale_products(params.limit).await?;

    let mut merges = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let Some(fetched) = fetcher.details(&candidate.url).await else {
            tracing::warn!("refresh fetch failed for {}", candidate.url);
            continue;
        };
        merges.push((
            candidate.id.clone(),
            ProductPatch {
                price: fetched.price,
                description: fetched.description,
                availability: fetched.availability,
                ..Default::default()
            },
        ));
    }

    let refreshed = db.apply_refresh(merges).await?;

    let output = RefreshCacheOutput { refreshed, candidates: candidates.len() };
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}

/// Implementation of the clear_cache tool.
///
/// Without the confirm flag nothing is touched and the caller is told so.
pub async fn clear_cache_impl(db: &Store, params: ClearCacheParams) -> Result<CallToolResult, McpError> {
    if !params.confirm {
        return Ok(CallToolResult::success(vec![Content::text(
            "Confirmation required to clear cache; pass confirm=true".to_string(),
        )]));
    }

    let cleared = db.clear_all().await?;
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&cleared).unwrap_or_default(),
    )]))
}

/// Implementation of the export_data tool.
///
/// The whole record set is serialized in memory and written in one shot;
/// expected cache sizes make that acceptable.
pub async fn export_data_impl(db: &Store, params: ExportDataParams) -> Result<CallToolResult, McpError> {
    let products = db.all_products().await?;
    let json = serde_json::to_string_pretty(&products)
        .map_err(|e| Error::Io(format!("failed to serialize export: {e}")))?;

    tokio::fs::write(&params.filename, json)
        .await
        .map_err(|e| Error::Io(format!("failed to write {}: {e}", params.filename)))?;

    let output = ExportDataOutput { path: params.filename, exported: products.len() };
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}

/// Implementation of the get_cache_stats tool.
pub async fn cache_stats_impl(db: &Store, _params: CacheStatsParams) -> Result<CallToolResult, McpError> {
    let stats = db.stats().await?;
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&stats).unwrap_or_default(),
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubCatalog, raw, result_json};
    use mandi_core::RawProduct;

    #[tokio::test]
    async fn test_refresh_partial_failure_merges_the_rest() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[
            raw(Some("A1"), "Mouse", Some("₹999")),
            raw(Some("A2"), "Keyboard", Some("₹1,500")),
        ])
        .await
        .unwrap();

        // only A1's detail page resolves; A2's fetch fails
        let fetcher = StubCatalog::default().with_details(
            "https://catalog.example/dp/A1",
            RawProduct {
                id: Some("A1".into()),
                title: "Mouse".into(),
                url: "https://catalog.example/dp/A1".into(),
                price: Some("₹949".into()),
                availability: Some("In Stock".into()),
                ..Default::default()
            },
        );

        let result = refresh_cache_impl(&db, &fetcher, RefreshCacheParams { limit: 10 })
            .await
            .unwrap();

        let json = result_json(&result);
        assert_eq!(json["candidates"], 2);
        assert_eq!(json["refreshed"], 1);

        let record = db.product_by_id("A1").await.unwrap().unwrap();
        assert_eq!(record.price.as_deref(), Some("₹949"));
        assert_eq!(db.price_history("A1").await.unwrap().len(), 2);

        let untouched = db.product_by_id("A2").await.unwrap().unwrap();
        assert_eq!(untouched.price.as_deref(), Some("₹1,500"));
        assert_eq!(db.price_history("A2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_respects_limit() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Mouse", None), raw(Some("A2"), "Keyboard", None)])
            .await
            .unwrap();

        let fetcher = StubCatalog::default();
        let result = refresh_cache_impl(&db, &fetcher, RefreshCacheParams { limit: 1 })
            .await
            .unwrap();

        let json = result_json(&result);
        assert_eq!(json["candidates"], 1);
        assert_eq!(json["refreshed"], 0);
    }

    #[tokio::test]
    async fn test_clear_requires_confirm() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Mouse", Some("₹999"))]).await.unwrap();
        db.log_search_start("mouse").await.unwrap();

        let result = clear_cache_impl(&db, ClearCacheParams { confirm: false }).await.unwrap();
        assert!(result_json(&result).as_str().unwrap().contains("Confirmation required"));

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.total_price_samples, 1);
        assert_eq!(stats.total_searches, 1);
    }

    #[tokio::test]
    async fn test_clear_with_confirm_empties_tables() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Mouse", Some("₹999"))]).await.unwrap();
        db.add_favorite("A1").await.unwrap();
        db.log_search_start("mouse").await.unwrap();

        let result = clear_cache_impl(&db, ClearCacheParams { confirm: true }).await.unwrap();
        let json = result_json(&result);
        assert_eq!(json["products"], 1);

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_products, 0);
        assert_eq!(stats.total_price_samples, 0);
        assert_eq!(stats.total_searches, 0);
        assert_eq!(stats.total_favorites, 1);
    }

    #[tokio::test]
    async fn test_export_empty_store() {
        let db = Store::open_in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        let params = ExportDataParams { filename: path.to_string_lossy().into_owned() };
        export_data_impl(&db, params).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&contents).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn test_export_two_records() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Mouse", Some("₹999")), raw(Some("A2"), "Lamp", None)])
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        let params = ExportDataParams { filename: path.to_string_lossy().into_owned() };
        let result = export_data_impl(&db, params).await.unwrap();
        assert_eq!(result_json(&result)["exported"], 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["id"], "A1");
        assert_eq!(parsed[0]["price"], "₹999");
        assert_eq!(parsed[0]["access_count"], 1);
    }

    #[tokio::test]
    async fn test_export_bad_path() {
        let db = Store::open_in_memory().await.unwrap();
        let params = ExportDataParams { filename: "/nonexistent-dir/out.json".into() };
        let result = export_data_impl(&db, params).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_output() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Mouse", Some("₹999"))]).await.unwrap();

        let result = cache_stats_impl(&db, CacheStatsParams::default()).await.unwrap();
        let json = result_json(&result);
        assert_eq!(json["total_products"], 1);
        assert_eq!(json["total_price_samples"], 1);
        assert_eq!(json["total_favorites"], 0);
    }
}
