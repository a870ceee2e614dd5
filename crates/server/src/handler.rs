//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to
//! the appropriate implementations. The handler owns the store handle and
//! the fetch capability; the tool modules hold the logic.

use std::sync::Arc;

use crate::tools::{details, favorites, maintenance, search, views};
use mandi_core::{CatalogFetcher, Store};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for mandi.
#[derive(Clone)]
pub struct CatalogServer {
    store: Store,
    fetcher: Arc<dyn CatalogFetcher>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler
/// methods.
#[tool_router]
impl CatalogServer {
    /// Create a new server handler over a store and a fetch capability.
    pub fn new(store: Store, fetcher: Arc<dyn CatalogFetcher>) -> Self {
        Self { store, fetcher, tool_router: Self::tool_router() }
    }

    #[tool(description = "Search catalog products, serving cached matches first and scraping on a miss.")]
    async fn search_product(&self, params: Parameters<search::SearchProductParams>) -> Result<CallToolResult, McpError> {
        search::search_product_impl(&self.store, self.fetcher.as_ref(), params.0).await
    }

    #[tool(description = "Get detailed product info (price, availability, description) for a product URL.")]
    async fn get_product_details(
        &self, params: Parameters<details::ProductDetailsParams>,
    ) -> Result<CallToolResult, McpError> {
        details::product_details_impl(&self.store, self.fetcher.as_ref(), params.0).await
    }

    #[tool(description = "Get trending products based on cache access patterns.")]
    async fn get_trending_products(&self, params: Parameters<views::ListingParams>) -> Result<CallToolResult, McpError> {
        views::trending_impl(&self.store, params.0).await
    }

    #[tool(description = "Get historical price data for a product id.")]
    async fn get_price_history(&self, params: Parameters<views::PriceHistoryParams>) -> Result<CallToolResult, McpError> {
        views::price_history_impl(&self.store, params.0).await
    }

    #[tool(description = "Add a product to favorites/watchlist.")]
    async fn add_to_favorites(
        &self, params: Parameters<favorites::AddFavoriteParams>,
    ) -> Result<CallToolResult, McpError> {
        favorites::add_favorite_impl(&self.store, params.0).await
    }

    #[tool(description = "List favorite products, most recently added first.")]
    async fn get_favorites(&self, params: Parameters<favorites::GetFavoritesParams>) -> Result<CallToolResult, McpError> {
        favorites::get_favorites_impl(&self.store, params.0).await
    }

    #[tool(description = "Remove a product from favorites.")]
    async fn remove_from_favorites(
        &self, params: Parameters<favorites::RemoveFavoriteParams>,
    ) -> Result<CallToolResult, McpError> {
        favorites::remove_favorite_impl(&self.store, params.0).await
    }

    #[tool(description = "Get recent search queries.")]
    async fn get_search_history(&self, params: Parameters<views::ListingParams>) -> Result<CallToolResult, McpError> {
        views::search_history_impl(&self.store, params.0).await
    }

    #[tool(description = "Get cached products similar to a product you like.")]
    async fn get_product_recommendations(
        &self, params: Parameters<views::RecommendationsParams>,
    ) -> Result<CallToolResult, McpError> {
        views::recommendations_impl(&self.store, params.0).await
    }

    #[tool(description = "Get access-pattern analytics over the cached records, optionally per category.")]
    async fn get_market_analytics(&self, params: Parameters<views::AnalyticsParams>) -> Result<CallToolResult, McpError> {
        views::analytics_impl(&self.store, params.0).await
    }

    #[tool(description = "Search the catalog by category name (Electronics, Fashion, ...).")]
    async fn search_by_category(
        &self, params: Parameters<search::SearchByCategoryParams>,
    ) -> Result<CallToolResult, McpError> {
        search::search_by_category_impl(self.fetcher.as_ref(), params.0).await
    }

    #[tool(description = "Get the latest products added to the cache.")]
    async fn get_latest_products(&self, params: Parameters<views::ListingParams>) -> Result<CallToolResult, McpError> {
        views::latest_impl(&self.store, params.0).await
    }

    #[tool(description = "Re-fetch the stalest cached records from the catalog.")]
    async fn refresh_cache(
        &self, params: Parameters<maintenance::RefreshCacheParams>,
    ) -> Result<CallToolResult, McpError> {
        maintenance::refresh_cache_impl(&self.store, self.fetcher.as_ref(), params.0).await
    }

    #[tool(description = "Search multiple queries at once, top results per query.")]
    async fn batch_search(&self, params: Parameters<search::BatchSearchParams>) -> Result<CallToolResult, McpError> {
        search::batch_search_impl(self.fetcher.as_ref(), params.0).await
    }

    #[tool(description = "Get database and cache statistics.")]
    async fn get_cache_stats(
        &self, params: Parameters<maintenance::CacheStatsParams>,
    ) -> Result<CallToolResult, McpError> {
        maintenance::cache_stats_impl(&self.store, params.0).await
    }

    #[tool(description = "Clear all cached data. Requires confirm=true.")]
    async fn clear_cache(&self, params: Parameters<maintenance::ClearCacheParams>) -> Result<CallToolResult, McpError> {
        maintenance::clear_cache_impl(&self.store, params.0).await
    }

    #[tool(description = "Export all cached product data to a JSON file.")]
    async fn export_data(&self, params: Parameters<maintenance::ExportDataParams>) -> Result<CallToolResult, McpError> {
        maintenance::export_data_impl(&self.store, params.0).await
    }
}

impl ServerHandler for CatalogServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-mandi".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
