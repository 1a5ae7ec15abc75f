//! Error types for the item store.

use thiserror::Error;

/// Errors that can occur while reading or updating order items.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order item does not exist.
    #[error("Order item not found: {0}")]
    ItemNotFound(String),

    /// Local database error.
    #[error("Database error: {0}")]
    Database(String),

    /// The remote store answered with an unexpected status.
    #[error("Item store request failed with HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request could not be sent or the response could not be read.
    #[error("Item store request failed: {0}")]
    Request(String),

    /// The store returned data that could not be decoded.
    #[error("Failed to decode item store response: {0}")]
    Decode(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}
