//! Fetch adapter boundary.
//!
//! The engine never talks to the catalog site directly; it consumes this
//! capability. Both methods are best-effort: a network or parse failure on
//! the other side surfaces as empty data here, never as an error. The
//! production implementation lives in the client crate; tests substitute a
//! deterministic double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Best-effort product data as fetched from the catalog.
///
/// Search result tiles and detail pages yield different subsets of these
/// fields; everything the page didn't offer stays `None`. `price` and
/// `rating` are display strings, not numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RawProduct {
    /// Catalog-assigned id (e.g. an ASIN). Records without one are never
    /// persisted.
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub reviews_count: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub availability: Option<String>,
    pub description: Option<String>,
}

/// Capability for obtaining fresh catalog data.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Search the catalog for a query. Empty on any failure.
    async fn search(&self, query: &str, page: u32) -> Vec<RawProduct>;

    /// Fetch a product detail page. `None` on any failure.
    async fn details(&self, url: &str) -> Option<RawProduct>;
}
