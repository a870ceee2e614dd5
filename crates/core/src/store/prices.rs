//! Price history samples.
//!
//! Append-only: a sample is written every time a record's price is
//! established or refreshed, including on first insert. Samples are never
//! updated or deleted individually, only by a full clear. The product
//! reference is soft; a sample whose product was cleared is simply
//! ignorable.

use super::connection::Store;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// One observed price for a product.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PriceSample {
    pub price: String,
    pub timestamp: String,
}

pub(crate) fn insert_sample(
    conn: &rusqlite::Connection, product_id: &str, price: &str, now: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO price_history (product_id, price, timestamp) VALUES (?1, ?2, ?3)",
        params![product_id, price, now],
    )?;
    Ok(())
}

impl Store {
    /// Unconditionally append a price sample for a product.
    pub async fn append_price_sample(&self, product_id: &str, price: &str) -> Result<(), Error> {
        let product_id = product_id.to_string();
        let price = price.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                insert_sample(conn, &product_id, &price, &now).map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// All samples for a product in insertion order, oldest first.
    pub async fn price_history(&self, product_id: &str) -> Result<Vec<PriceSample>, Error> {
        let product_id = product_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<PriceSample>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT price, timestamp FROM price_history WHERE product_id = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![product_id], |row| {
                    Ok(PriceSample { price: row.get(0)?, timestamp: row.get(1)? })
                })?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_read_in_insertion_order() {
        let db = Store::open_in_memory().await.unwrap();
        db.append_price_sample("A1", "₹999").await.unwrap();
        db.append_price_sample("A1", "₹899").await.unwrap();
        db.append_price_sample("A2", "₹49").await.unwrap();

        let history = db.price_history("A1").await.unwrap();
        let prices: Vec<_> = history.iter().map(|s| s.price.as_str()).collect();
        assert_eq!(prices, ["₹999", "₹899"]);
    }

    #[tokio::test]
    async fn test_history_missing_product() {
        let db = Store::open_in_memory().await.unwrap();
        let history = db.price_history("nope").await.unwrap();
        assert!(history.is_empty());
    }
}
