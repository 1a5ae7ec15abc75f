//! Item store trait.

use async_trait::async_trait;

use super::error::StoreError;
use super::types::OrderItemRecord;

/// External store holding order items.
///
/// The pipeline never creates or deletes items; it only flips the extracted
/// flag and records which orders have been notified.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Sets `pngExtracted = true` on the item.
    ///
    /// Returns `StoreError::ItemNotFound` if the item does not exist.
    async fn mark_extracted(&self, order_item_id: &str) -> Result<(), StoreError>;

    /// Returns every item belonging to `order_id`, whatever its status.
    async fn items_for_order(&self, order_id: &str) -> Result<Vec<OrderItemRecord>, StoreError>;

    /// Atomically claims the right to notify for `order_id`.
    ///
    /// Returns `true` for exactly one caller per order; later callers get `false`.
    async fn claim_notification(&self, order_id: &str) -> Result<bool, StoreError>;
}
