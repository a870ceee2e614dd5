//! Read-only projections over the record store: trending, latest, price
//! history, recommendations, analytics and search history.
//!
//! None of these touch the catalog; they are parameterized queries with
//! JSON rendering.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mandi_core::{Error, Store};

/// Input parameters for get_trending_products and get_latest_products.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListingParams {
    /// Max results (default: 20).
    #[serde(default = "default_listing_limit")]
    pub limit: u32,
}

impl Default for ListingParams {
    fn default() -> Self {
        Self { limit: default_listing_limit() }
    }
}

fn default_listing_limit() -> u32 {
    20
}

/// Input parameters for get_price_history tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PriceHistoryParams {
    /// Catalog id of the product (required).
    pub product_id: String,
}

/// Input parameters for get_product_recommendations tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationsParams {
    /// Catalog id of the product to recommend around (required).
    pub product_id: String,

    /// Max results (default: 10).
    #[serde(default = "default_recommendations_limit")]
    pub limit: u32,
}

fn default_recommendations_limit() -> u32 {
    10
}

/// Input parameters for get_market_analytics tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsParams {
    /// Narrow the aggregate to one category (optional).
    #[serde(default)]
    pub category: Option<String>,
}

/// Implementation of the get_trending_products tool.
pub async fn trending_impl(db: &Store, params: ListingParams) -> Result<CallToolResult, McpError> {
    let products = db.trending(params.limit).await?;
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&products).unwrap_or_default(),
    )]))
}

/// Implementation of the get_latest_products tool.
pub async fn latest_impl(db: &Store, params: ListingParams) -> Result<CallToolResult, McpError> {
    let products = db.latest(params.limit).await?;
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&products).unwrap_or_default(),
    )]))
}

/// Implementation of the get_price_history tool.
///
/// An unknown id yields an empty history, not an error.
pub async fn price_history_impl(db: &Store, params: PriceHistoryParams) -> Result<CallToolResult, McpError> {
    let history = db.price_history(&params.product_id).await?;
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&history).unwrap_or_default(),
    )]))
}

/// Implementation of the get_product_recommendations tool.
///
/// A seed id that is not cached is an informational outcome, not a failed
/// call.
pub async fn recommendations_impl(db: &Store, params: RecommendationsParams) -> Result<CallToolResult, McpError> {
    match db.recommendations(&params.product_id, params.limit).await {
        Ok(products) => Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&products).unwrap_or_default(),
        )])),
        Err(Error::NotFound(id)) => Ok(CallToolResult::success(vec![Content::text(format!(
            "Product {id} not found, no recommendations"
        ))])),
        Err(e) => Err(e.into()),
    }
}

/// Implementation of the get_market_analytics tool.
pub async fn analytics_impl(db: &Store, params: AnalyticsParams) -> Result<CallToolResult, McpError> {
    let analytics = db.market_analytics(params.category).await?;
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&analytics).unwrap_or_default(),
    )]))
}

/// Implementation of the get_search_history tool.
pub async fn search_history_impl(db: &Store, params: ListingParams) -> Result<CallToolResult, McpError> {
    let history = db.search_history(params.limit).await?;
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&history).unwrap_or_default(),
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{raw, result_json};

    #[tokio::test]
    async fn test_trending_respects_limit() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[
            raw(Some("A1"), "Mouse", None),
            raw(Some("A2"), "Keyboard", None),
            raw(Some("A3"), "Lamp", None),
        ])
        .await
        .unwrap();

        let result = trending_impl(&db, ListingParams { limit: 2 }).await.unwrap();
        assert_eq!(result_json(&result).as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_price_history_unknown_id_empty() {
        let db = Store::open_in_memory().await.unwrap();
        let result = price_history_impl(&db, PriceHistoryParams { product_id: "nope".into() })
            .await
            .unwrap();
        assert!(result_json(&result).as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommendations_unknown_seed_is_informational() {
        let db = Store::open_in_memory().await.unwrap();
        let result = recommendations_impl(&db, RecommendationsParams { product_id: "nope".into(), limit: 5 })
            .await
            .unwrap();
        let json = result_json(&result);
        assert!(json.as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_recommendations_excludes_seed() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[
            raw(Some("A1"), "Wireless Mouse", None),
            raw(Some("A2"), "Wireless Keyboard", None),
        ])
        .await
        .unwrap();

        let result = recommendations_impl(&db, RecommendationsParams { product_id: "A1".into(), limit: 5 })
            .await
            .unwrap();
        let json = result_json(&result);
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["id"], "A2");
    }

    #[tokio::test]
    async fn test_analytics_shape() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Mouse", None)]).await.unwrap();

        let result = analytics_impl(&db, AnalyticsParams::default()).await.unwrap();
        let json = result_json(&result);
        assert_eq!(json["product_count"], 1);
        assert_eq!(json["avg_popularity"], 1.0);
    }

    #[tokio::test]
    async fn test_search_history_listing() {
        let db = Store::open_in_memory().await.unwrap();
        db.log_search_start("mouse").await.unwrap();
        db.log_search_start("lamp").await.unwrap();

        let result = search_history_impl(&db, ListingParams::default()).await.unwrap();
        let json = result_json(&result);
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["query"], "lamp");
    }
}
