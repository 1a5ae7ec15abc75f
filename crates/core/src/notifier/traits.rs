//! Trait definitions for the notifier module.

use async_trait::async_trait;

use super::error::NotificationError;

/// Sends the completion signal for an order.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the name of this notifier implementation.
    fn name(&self) -> &str;

    /// Notifies that every approved item of `order_id` has been converted.
    async fn notify(&self, order_id: &str) -> Result<(), NotificationError>;
}
