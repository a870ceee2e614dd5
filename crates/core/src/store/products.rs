//! Product record operations.
//!
//! The products table is the cache's single write path: a record is created
//! on the first successful merge of a fetched result, mutated by every later
//! fetch that resolves to the same id, and deleted only by a full clear.

use super::connection::Store;
use crate::Error;
use crate::fetch::RawProduct;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached catalog product.
///
/// `price`, `rating` and `reviews_count` are opaque display strings exactly
/// as scraped ("₹1,299", "4.3"); nothing in the store parses them.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProductRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub reviews_count: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub availability: Option<String>,
    pub description: Option<String>,
    pub specs: Option<String>,
    pub created_at: String,
    pub last_updated: String,
    pub access_count: i64,
}

/// Fields a merge is allowed to touch. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub availability: Option<String>,
    pub specs: Option<String>,
}

/// Access-count aggregate for the analytics view.
///
/// Price and rating aggregation is deliberately absent: those columns are
/// opaque display strings.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MarketAnalytics {
    pub product_count: i64,
    pub avg_popularity: Option<f64>,
}

pub(crate) const PRODUCT_COLUMNS: &str = "id, title, url, price, rating, reviews_count, image_url, category, \
     availability, description, specs, created_at, last_updated, access_count";

pub(crate) fn read_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductRecord> {
    Ok(ProductRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        price: row.get(3)?,
        rating: row.get(4)?,
        reviews_count: row.get(5)?,
        image_url: row.get(6)?,
        category: row.get(7)?,
        availability: row.get(8)?,
        description: row.get(9)?,
        specs: row.get(10)?,
        created_at: row.get(11)?,
        last_updated: row.get(12)?,
        access_count: row.get(13)?,
    })
}

/// Insert unless the id or url already exists. Returns whether a row landed.
pub(crate) fn insert_product(
    conn: &rusqlite::Connection, id: &str, product: &RawProduct, now: &str,
) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO products (
            id, title, url, price, rating, reviews_count, image_url,
            category, availability, description, created_at, last_updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            id,
            &product.title,
            &product.url,
            &product.price,
            &product.rating,
            &product.reviews_count,
            &product.image_url,
            &product.category,
            &product.availability,
            &product.description,
            now,
            now,
        ],
    )?;
    Ok(inserted > 0)
}

/// COALESCE-merge of the supplied fields, bumping last_updated and
/// access_count. Returns whether a row matched the id.
pub(crate) fn merge_fields(
    conn: &rusqlite::Connection, id: &str, patch: &ProductPatch, now: &str,
) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE products SET
            title = COALESCE(?1, title),
            price = COALESCE(?2, price),
            description = COALESCE(?3, description),
            availability = COALESCE(?4, availability),
            specs = COALESCE(?5, specs),
            last_updated = ?6,
            access_count = access_count + 1
        WHERE id = ?7",
        params![
            &patch.title,
            &patch.price,
            &patch.description,
            &patch.availability,
            &patch.specs,
            now,
            id
        ],
    )?;
    Ok(updated > 0)
}

impl Store {
    /// Insert a fetched record unless the id (or url) is already cached.
    ///
    /// Conflicts are a no-op: existing fields, `created_at` included, are
    /// never overwritten on this path. Callers needing field updates go
    /// through [`Store::touch_and_merge`]. Returns whether a row was
    /// inserted.
    pub async fn upsert_product(&self, id: &str, product: &RawProduct) -> Result<bool, Error> {
        let id = id.to_string();
        let product = product.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                insert_product(conn, &id, &product, &now).map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Merge only the supplied fields into an existing record.
    ///
    /// Sets `last_updated` to now and increments `access_count`. Returns
    /// whether a row matched the id; a miss is not an error.
    pub async fn touch_and_merge(&self, id: &str, patch: &ProductPatch) -> Result<bool, Error> {
        let id = id.to_string();
        let patch = patch.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                merge_fields(conn, &id, &patch, &now).map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Get a product by its catalog id.
    pub async fn product_by_id(&self, id: &str) -> Result<Option<ProductRecord>, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<ProductRecord>, Error> {
                let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
                let result = conn.query_row(&sql, params![id], |row| read_product(row));

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Title substring search, most-accessed first.
    ///
    /// However stale, a non-empty result set is served as-is by the search
    /// path; freshness is only addressed by the explicit refresh operation.
    pub async fn search_by_title(&self, query: &str, limit: u32) -> Result<Vec<ProductRecord>, Error> {
        let pattern = format!("%{query}%");
        self.conn
            .call(move |conn| -> Result<Vec<ProductRecord>, Error> {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products
                     WHERE title LIKE ?1 ORDER BY access_count DESC LIMIT ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![pattern, limit], |row| read_product(row))?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Top-N records by access count.
    pub async fn trending(&self, limit: u32) -> Result<Vec<ProductRecord>, Error> {
        self.ordered_products("access_count DESC", limit).await
    }

    /// Newest-first records by creation time.
    pub async fn latest(&self, limit: u32) -> Result<Vec<ProductRecord>, Error> {
        self.ordered_products("created_at DESC", limit).await
    }

    /// Refresh candidates: the records whose data has gone longest without
    /// an update.
    pub async fn stale_products(&self, limit: u32) -> Result<Vec<ProductRecord>, Error> {
        self.ordered_products("last_updated ASC", limit).await
    }

    async fn ordered_products(&self, order: &'static str, limit: u32) -> Result<Vec<ProductRecord>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<ProductRecord>, Error> {
                let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY {order} LIMIT ?1");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit], |row| read_product(row))?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Every cached record, for export. The whole set is pulled into memory;
    /// expected cache sizes make that acceptable.
    pub async fn all_products(&self) -> Result<Vec<ProductRecord>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<ProductRecord>, Error> {
                let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| read_product(row))?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Similar products for a seed record: shares the seed title's first
    /// word, excludes the seed itself. A heuristic, not a similarity model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the seed id is not cached; callers
    /// report that as an informational outcome, not a failure.
    pub async fn recommendations(&self, product_id: &str, limit: u32) -> Result<Vec<ProductRecord>, Error> {
        let product_id = product_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<ProductRecord>, Error> {
                let title: String = match conn.query_row(
                    "SELECT title FROM products WHERE id = ?1",
                    params![product_id],
                    |row| row.get(0),
                ) {
                    Ok(title) => title,
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        return Err(Error::NotFound(product_id.clone()));
                    }
                    Err(e) => return Err(e.into()),
                };

                let first_word = title.split_whitespace().next().unwrap_or(&title);
                let pattern = format!("%{first_word}%");

                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products
                     WHERE title LIKE ?1 AND id != ?2 LIMIT ?3"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![pattern, product_id, limit], |row| read_product(row))?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Access-count aggregate over all records, optionally narrowed to one
    /// category. `avg_popularity` is `None` on an empty set.
    pub async fn market_analytics(&self, category: Option<String>) -> Result<MarketAnalytics, Error> {
        self.conn
            .call(move |conn| -> Result<MarketAnalytics, Error> {
                let (count, avg) = match &category {
                    Some(cat) => conn.query_row(
                        "SELECT COUNT(*), AVG(access_count) FROM products WHERE category = ?1",
                        params![cat],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )?,
                    None => conn.query_row(
                        "SELECT COUNT(*), AVG(access_count) FROM products",
                        [],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )?,
                };
                Ok(MarketAnalytics { product_count: count, avg_popularity: avg })
            })
            .await
            .map_err(Error::from)
    }
}
