//! mandi server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on
//! stdout. A store or config failure here is the only fatal path; everything
//! after startup is reported per-call.

use std::sync::Arc;

use anyhow::Result;
use mandi_client::{ScrapeClient, ScrapeConfig};
use mandi_core::{AppConfig, Store};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let store = Store::open(&config.db_path).await?;
    tracing::info!("cache database ready at {}", config.db_path.display());

    let fetcher = ScrapeClient::new(ScrapeConfig {
        base_url: config.base_url.clone(),
        user_agents: config.user_agents.clone(),
        timeout: config.timeout(),
        ..Default::default()
    })?;

    tracing::info!("Starting mcp-mandi server on stdio transport");

    let handler = handler::CatalogServer::new(store, Arc::new(fetcher));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
