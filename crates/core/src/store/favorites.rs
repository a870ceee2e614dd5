//! Favorite marks.
//!
//! A set over product ids: at most one mark per product, enforced by a
//! UNIQUE constraint. Adding an existing mark reports a duplicate instead
//! of inserting twice.

use super::connection::Store;
use super::products::{PRODUCT_COLUMNS, ProductRecord, read_product};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl Store {
    /// Mark a product as a favorite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Duplicate`] if the product is already marked;
    /// callers translate that into an informational message rather than a
    /// failure.
    pub async fn add_favorite(&self, product_id: &str) -> Result<(), Error> {
        let product_id = product_id.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                match conn.execute(
                    "INSERT INTO favorites (product_id, created_at) VALUES (?1, ?2)",
                    params![product_id, now],
                ) {
                    Ok(_) => Ok(()),
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        Err(Error::Duplicate(product_id.clone()))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Unmark a product. Returns whether a mark existed; absence is not an
    /// error.
    pub async fn remove_favorite(&self, product_id: &str) -> Result<bool, Error> {
        let product_id = product_id.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn
                    .execute("DELETE FROM favorites WHERE product_id = ?1", params![product_id])
                    .map_err(Error::from)?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Favorite products, most recently marked first.
    ///
    /// Inner join: a mark whose product was cleared drops out of the
    /// listing.
    pub async fn favorites(&self, limit: u32) -> Result<Vec<ProductRecord>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<ProductRecord>, Error> {
                // qualify the shared column list: favorites has id/created_at too
                let columns = PRODUCT_COLUMNS
                    .split(", ")
                    .map(|c| format!("p.{c}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "SELECT {columns} FROM products p
                     JOIN favorites f ON p.id = f.product_id
                     ORDER BY f.created_at DESC LIMIT ?1"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit], |row| read_product(row))?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }
}
