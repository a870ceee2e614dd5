//! Unified error types for mandi.
//!
//! An adapter fetch that comes back empty is not represented here: the
//! fetch boundary is best-effort and "no data" is a valid outcome the
//! cache policy handles as empty results.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the mandi server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Storage(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Favorite mark already present for this product.
    #[error("DUPLICATE: product {0} is already a favorite")]
    Duplicate(String),

    /// Destructive operation invoked without its confirm flag.
    #[error("CONFIRMATION_REQUIRED: {0}")]
    ConfirmationRequired(String),

    /// Requested product id is not in the cache.
    #[error("NOT_FOUND: product {0}")]
    NotFound(String),

    /// Export file could not be written.
    #[error("IO_ERROR: {0}")]
    Io(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Storage(tokio_rusqlite::Error::Close(c)),
            _ => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Storage(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Storage(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Duplicate(id) => (-32020, format!("product {id} is already a favorite")),
            Error::ConfirmationRequired(msg) => (-32021, msg.clone()),
            Error::NotFound(id) => (-32022, format!("product {id} not found")),
            Error::Io(msg) => (-32023, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
