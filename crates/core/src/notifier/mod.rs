//! Completion notification for finished orders.
//!
//! The pipeline calls the notifier once it has decided an order is complete.
//! Failures are reported back to the pipeline, which logs them and moves on;
//! the conversion and status update are never rolled back.

mod error;
mod traits;
mod webhook;

pub use error::NotificationError;
pub use traits::Notifier;
pub use webhook::WebhookNotifier;
