//! Transactional merge paths.
//!
//! A request's reads and writes must commit or roll back together. The
//! multi-row paths (search-result merge, detail merge, bulk refresh) run
//! inside a single transaction here instead of chaining the per-row
//! operations, so a failure mid-batch leaves no partial state behind.
//! Conflicting merges for the same id are last-write-wins per field,
//! serialized by SQLite.

use super::connection::Store;
use super::prices::insert_sample;
use super::products::{PRODUCT_COLUMNS, ProductPatch, ProductRecord, insert_product, merge_fields, read_product};
use crate::Error;
use crate::fetch::RawProduct;
use tokio_rusqlite::params;

impl Store {
    /// Merge freshly fetched search results into the cache.
    ///
    /// Records without a catalog id are skipped. Each record that lacked a
    /// pre-existing entry is inserted, and its price (when the fetch
    /// produced one) becomes the first history sample. Returns the number
    /// of records inserted.
    pub async fn merge_search_results(&self, products: &[RawProduct]) -> Result<usize, Error> {
        let products = products.to_vec();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction().map_err(Error::from)?;
                let mut inserted = 0usize;
                for product in &products {
                    let Some(id) = product.id.as_deref() else {
                        continue;
                    };
                    if insert_product(&tx, id, product, &now)? {
                        inserted += 1;
                        if let Some(price) = product.price.as_deref() {
                            insert_sample(&tx, id, price, &now)?;
                        }
                    }
                }
                tx.commit().map_err(Error::from)?;
                Ok(inserted)
            })
            .await
            .map_err(Error::from)
    }

    /// Details-path merge: touch-and-merge the fetched fields, sample the
    /// fetched price, and re-read the merged row as the canonical response.
    ///
    /// Returns `None` when no cached row matches the id; the caller then
    /// falls back to the raw fetched data without persisting anything.
    pub async fn merge_detail(&self, id: &str, patch: &ProductPatch) -> Result<Option<ProductRecord>, Error> {
        let id = id.to_string();
        let patch = patch.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<Option<ProductRecord>, Error> {
                let tx = conn.transaction().map_err(Error::from)?;
                if !merge_fields(&tx, &id, &patch, &now)? {
                    return Ok(None);
                }
                if let Some(price) = patch.price.as_deref() {
                    insert_sample(&tx, &id, price, &now)?;
                }
                let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
                let record = tx.query_row(&sql, params![id], |row| read_product(row))?;
                tx.commit().map_err(Error::from)?;
                Ok(Some(record))
            })
            .await
            .map_err(Error::from)
    }

    /// Commit a batch of refresh merges in one transaction.
    ///
    /// Items are (id, patch) pairs for the candidates whose detail fetch
    /// succeeded. Every matched row gets a price sample when its patch
    /// carries a price, whether or not the value changed. Returns the
    /// number of rows merged.
    pub async fn apply_refresh(&self, merges: Vec<(String, ProductPatch)>) -> Result<usize, Error> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction().map_err(Error::from)?;
                let mut refreshed = 0usize;
                for (id, patch) in &merges {
                    if merge_fields(&tx, id, patch, &now)? {
                        refreshed += 1;
                        if let Some(price) = patch.price.as_deref() {
                            insert_sample(&tx, id, price, &now)?;
                        }
                    }
                }
                tx.commit().map_err(Error::from)?;
                Ok(refreshed)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: Option<&str>, title: &str, price: Option<&str>) -> RawProduct {
        RawProduct {
            id: id.map(str::to_string),
            title: title.to_string(),
            url: format!("https://catalog.example/dp/{}", id.unwrap_or("unknown")),
            price: price.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_merge_search_results_skips_idless_and_samples_inserts() {
        let db = Store::open_in_memory().await.unwrap();
        let fetched = vec![
            raw(Some("A1"), "Wireless Mouse", Some("₹999")),
            raw(None, "No Id Product", Some("₹1")),
            raw(Some("A2"), "Wireless Keyboard", None),
        ];

        let inserted = db.merge_search_results(&fetched).await.unwrap();
        assert_eq!(inserted, 2);

        let history = db.price_history("A1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, "₹999");
        assert!(db.price_history("A2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_search_results_no_resample_on_conflict() {
        let db = Store::open_in_memory().await.unwrap();
        let fetched = vec![raw(Some("A1"), "Wireless Mouse", Some("₹999"))];
        db.merge_search_results(&fetched).await.unwrap();

        let again = vec![raw(Some("A1"), "Wireless Mouse", Some("₹899"))];
        let inserted = db.merge_search_results(&again).await.unwrap();
        assert_eq!(inserted, 0);

        // existing record untouched, no extra sample
        let record = db.product_by_id("A1").await.unwrap().unwrap();
        assert_eq!(record.price.as_deref(), Some("₹999"));
        assert_eq!(db.price_history("A1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_detail_updates_and_samples() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Wireless Mouse", Some("₹999"))])
            .await
            .unwrap();

        let patch = ProductPatch {
            price: Some("₹899".to_string()),
            availability: Some("In Stock".to_string()),
            ..Default::default()
        };
        let merged = db.merge_detail("A1", &patch).await.unwrap().unwrap();
        assert_eq!(merged.price.as_deref(), Some("₹899"));
        assert_eq!(merged.availability.as_deref(), Some("In Stock"));
        assert_eq!(merged.access_count, 2);

        let prices: Vec<_> = db
            .price_history("A1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.price)
            .collect();
        assert_eq!(prices, ["₹999", "₹899"]);
    }

    #[tokio::test]
    async fn test_merge_detail_unknown_id() {
        let db = Store::open_in_memory().await.unwrap();
        let merged = db.merge_detail("ZZ", &ProductPatch::default()).await.unwrap();
        assert!(merged.is_none());
        assert!(db.price_history("ZZ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_refresh_counts_matches_only() {
        let db = Store::open_in_memory().await.unwrap();
        db.merge_search_results(&[raw(Some("A1"), "Mouse", Some("₹999"))]).await.unwrap();

        let merges = vec![
            ("A1".to_string(), ProductPatch { price: Some("₹999".to_string()), ..Default::default() }),
            ("GONE".to_string(), ProductPatch { price: Some("₹5".to_string()), ..Default::default() }),
        ];
        let refreshed = db.apply_refresh(merges).await.unwrap();
        assert_eq!(refreshed, 1);

        // unchanged price still gets a fresh sample
        assert_eq!(db.price_history("A1").await.unwrap().len(), 2);
    }
}
