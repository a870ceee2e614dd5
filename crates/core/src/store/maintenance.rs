//! Bulk maintenance operations: cache clear and row-count statistics.

use super::connection::Store;
use crate::Error;
use serde::{Deserialize, Serialize};

/// Row counts across the persisted tables.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheStats {
    pub total_products: i64,
    pub total_price_samples: i64,
    pub total_favorites: i64,
    pub total_searches: i64,
}

/// What a full clear removed.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ClearedCounts {
    pub products: usize,
    pub price_samples: usize,
    pub searches: usize,
}

impl Store {
    /// Delete all products, price samples and search log rows in one
    /// transaction.
    ///
    /// Favorite marks are left in place; a mark whose product is gone
    /// simply drops out of the joined favorites listing.
    pub async fn clear_all(&self) -> Result<ClearedCounts, Error> {
        self.conn
            .call(move |conn| -> Result<ClearedCounts, Error> {
                let tx = conn.transaction().map_err(Error::from)?;
                let products = tx.execute("DELETE FROM products", [])?;
                let price_samples = tx.execute("DELETE FROM price_history", [])?;
                let searches = tx.execute("DELETE FROM search_history", [])?;
                tx.commit().map_err(Error::from)?;
                Ok(ClearedCounts { products, price_samples, searches })
            })
            .await
            .map_err(Error::from)
    }

    /// Row counts for the stats view.
    pub async fn stats(&self) -> Result<CacheStats, Error> {
        self.conn
            .call(move |conn| -> Result<CacheStats, Error> {
                let count = |table: &str| -> Result<i64, Error> {
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                        .map_err(Error::from)
                };
                Ok(CacheStats {
                    total_products: count("products")?,
                    total_price_samples: count("price_history")?,
                    total_favorites: count("favorites")?,
                    total_searches: count("search_history")?,
                })
            })
            .await
            .map_err(Error::from)
    }
}
