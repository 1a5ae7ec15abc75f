//! Error types for the notifier module.

use thiserror::Error;

/// Errors that can occur while sending a completion notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The request could not be built or sent.
    #[error("Webhook request failed: {0}")]
    Request(String),

    /// The receiver answered with a non-success status.
    #[error("Webhook rejected notification with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}
