//! SQLite-backed store for the product cache.
//!
//! Durable keyed storage for product records, price samples, favorite
//! marks and search log entries, with async access via tokio-rusqlite.
//! It supports:
//!
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Single-transaction composites for the multi-row request paths

pub mod connection;
pub mod favorites;
pub mod maintenance;
pub mod merge;
pub mod migrations;
pub mod prices;
pub mod products;
pub mod searches;

pub use crate::Error;

pub use connection::Store;
pub use maintenance::{CacheStats, ClearedCounts};
pub use prices::PriceSample;
pub use products::{MarketAnalytics, ProductPatch, ProductRecord};
pub use searches::SearchLogEntry;
