//! add_to_favorites, get_favorites and remove_from_favorites.
//!
//! Adding an existing favorite is a duplicate outcome, reported as a
//! friendly message rather than a failed call.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mandi_core::{Error, Store};

/// Input parameters for add_to_favorites tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AddFavoriteParams {
    /// Catalog id of the product (required).
    pub product_id: String,

    /// Product URL, accepted when the id came from a page link. The id is
    /// authoritative; this field is informational.
    #[serde(default)]
    pub url: Option<String>,
}

/// Input parameters for get_favorites tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetFavoritesParams {
    /// Max results (default: 50).
    #[serde(default = "default_favorites_limit")]
    pub limit: u32,
}

impl Default for GetFavoritesParams {
    fn default() -> Self {
        Self { limit: default_favorites_limit() }
    }
}

fn default_favorites_limit() -> u32 {
    50
}

/// Input parameters for remove_from_favorites tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RemoveFavoriteParams {
    /// Catalog id of the product (required).
    pub product_id: String,
}

/// Implementation of the add_to_favorites tool.
pub async fn add_favorite_impl(db: &Store, params: AddFavoriteParams) -> Result<CallToolResult, McpError> {
    if params.product_id.is_empty() {
        return Err(Error::InvalidInput("product_id cannot be empty".into()).into());
    }
    if let Some(url) = &params.url {
        tracing::debug!("favoriting {} (from {url})", params.product_id);
    }

    match db.add_favorite(&params.product_id).await {
        Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
            "Added {} to favorites",
            params.product_id
        ))])),
        Err(Error::Duplicate(_)) => Ok(CallToolResult::success(vec![Content::text(format!(
            "Product {} already in favorites",
            params.product_id
        ))])),
        Err(e) => Err(e.into()),
    }
}

/// Implementation of the get_favorites tool.
pub async fn get_favorites_impl(db: &Store, params: GetFavoritesParams) -> Result<CallToolResult, McpError> {
    let favorites = db.favorites(params.limit).await?;
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&favorites).unwrap_or_default(),
    )]))
}

/// Implementation of the remove_from_favorites tool.
pub async fn remove_favorite_impl(db: &Store, params: RemoveFavoriteParams) -> Result<CallToolResult, McpError> {
    if params.product_id.is_empty() {
        return Err(Error::InvalidInput("product_id cannot be empty".into()).into());
    }

    let removed = db.remove_favorite(&params.product_id).await?;
    let message = if removed {
        format!("Removed {} from favorites", params.product_id)
    } else {
        format!("Product {} was not in favorites", params.product_id)
    };
    Ok(CallToolResult::success(vec![Content::text(message)]))
}
