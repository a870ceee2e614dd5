//! get_product_details implementation.
//!
//! Detail pages are volatile (price, availability), so this path always
//! hits the catalog; there is no cache short-circuit. The merge happens
//! only after the fetch returns, so a canceled call leaves the store
//! exactly as it was.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mandi_core::{CatalogFetcher, Error, ProductPatch, Store};

/// Input parameters for get_product_details tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProductDetailsParams {
    /// Product page URL (required).
    pub url: String,
}

/// Implementation of the get_product_details tool.
///
/// When the fetched record carries a catalog id and the cache holds that
/// id, the fetched fields are merged and the merged store row is the
/// response — the store's field superset wins over the raw fetch. Without
/// a usable id (or a cached row) the raw fetch is returned unpersisted.
pub async fn product_details_impl(
    db: &Store, fetcher: &dyn CatalogFetcher, params: ProductDetailsParams,
) -> Result<CallToolResult, McpError> {
    if params.url.is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    url::Url::parse(&params.url).map_err(|e| Error::InvalidInput(format!("invalid url: {e}")))?;

    let Some(fetched) = fetcher.details(&params.url).await else {
        return Ok(CallToolResult::success(vec![Content::text(format!(
            "No data available for {}",
            params.url
        ))]));
    };

    if let Some(id) = fetched.id.clone() {
        let patch = ProductPatch {
            price: fetched.price.clone(),
            description: fetched.description.clone(),
            availability: fetched.availability.clone(),
            ..Default::default()
        };

        if let Some(merged) = db.merge_detail(&id, &patch).await? {
            return Ok(CallToolResult::success(vec![Content::text(
                serde_json::to_string_pretty(&merged).unwrap_or_default(),
            )]));
        }
    }

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&fetched).unwrap_or_default(),
    )]))
}
