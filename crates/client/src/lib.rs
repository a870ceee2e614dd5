//! Catalog scrape client for mandi.
//!
//! The production implementation of the fetch capability: HTTP fetch of
//! catalog search and product detail pages plus CSS-selector extraction.
//! Best-effort throughout; failures degrade to empty results rather than
//! erroring the caller.

pub mod catalog;

pub use catalog::{ScrapeClient, ScrapeConfig, ScrapeError};
