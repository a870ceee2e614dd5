//! Core types and shared functionality for mandi.
//!
//! This crate provides:
//! - Product cache store with SQLite backend
//! - Fetch adapter boundary consumed by the cache policy
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod fetch;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use fetch::{CatalogFetcher, RawProduct};
pub use store::{ProductPatch, ProductRecord, Store};
