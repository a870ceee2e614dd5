//! Search query log.
//!
//! Append-only: an entry is written at the start of a search with a zero
//! count and updated once results are known. The start call hands back the
//! row id so the result update targets exactly the row it created, even
//! when the same query text is logged concurrently.

use super::connection::Store;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// One logged search.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchLogEntry {
    pub id: i64,
    pub query: String,
    pub results_count: i64,
    pub created_at: String,
}

impl Store {
    /// Record the start of a search. Returns the log row id.
    pub async fn log_search_start(&self, query: &str) -> Result<i64, Error> {
        let query = query.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO search_history (query, results_count, created_at) VALUES (?1, 0, ?2)",
                    params![query, now],
                )
                .map_err(Error::from)?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// Record the final result count against a log row id.
    pub async fn log_search_result(&self, log_id: i64, count: u32) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE search_history SET results_count = ?1 WHERE id = ?2",
                    params![count, log_id],
                )
                .map_err(Error::from)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Recent searches, newest first.
    pub async fn search_history(&self, limit: u32) -> Result<Vec<SearchLogEntry>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<SearchLogEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, query, results_count, created_at FROM search_history
                     ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], |row| {
                    Ok(SearchLogEntry {
                        id: row.get(0)?,
                        query: row.get(1)?,
                        results_count: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }
}
