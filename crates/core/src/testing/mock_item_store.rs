//! Mock item store for testing.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::items::{ItemStore, OrderItemRecord, StoreError};

/// In-memory implementation of the ItemStore trait.
///
/// # Example
///
/// ```rust,ignore
/// use pngflow_core::testing::MockItemStore;
///
/// let store = MockItemStore::new();
/// store.insert(OrderItemRecord::new("I1", "O100", "approved")).await;
///
/// // ... run the pipeline ...
///
/// assert!(store.get("I1").await.unwrap().png_extracted);
/// assert_eq!(store.claimed_orders().await, vec!["O100"]);
/// ```
#[derive(Debug, Default)]
pub struct MockItemStore {
    items: Arc<RwLock<HashMap<String, OrderItemRecord>>>,
    claimed: Arc<RwLock<BTreeSet<String>>>,
    marked: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<StoreError>>>,
}

impl MockItemStore {
    /// Create a new empty mock item store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    pub async fn insert(&self, record: OrderItemRecord) {
        self.items
            .write()
            .await
            .insert(record.order_item_id.clone(), record);
    }

    /// Get an item by ID.
    pub async fn get(&self, order_item_id: &str) -> Option<OrderItemRecord> {
        self.items.read().await.get(order_item_id).cloned()
    }

    /// Orders whose notification has been claimed, sorted.
    pub async fn claimed_orders(&self) -> Vec<String> {
        self.claimed.read().await.iter().cloned().collect()
    }

    /// Item IDs passed to `mark_extracted`, in call order.
    pub async fn marked_items(&self) -> Vec<String> {
        self.marked.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: StoreError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<StoreError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl ItemStore for MockItemStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn mark_extracted(&self, order_item_id: &str) -> Result<(), StoreError> {
        self.marked.write().await.push(order_item_id.to_string());
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let mut items = self.items.write().await;
        let item = items
            .get_mut(order_item_id)
            .ok_or_else(|| StoreError::ItemNotFound(order_item_id.to_string()))?;
        item.png_extracted = true;
        Ok(())
    }

    async fn items_for_order(&self, order_id: &str) -> Result<Vec<OrderItemRecord>, StoreError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let mut items: Vec<OrderItemRecord> = self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.order == order_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.order_item_id.cmp(&b.order_item_id));
        Ok(items)
    }

    async fn claim_notification(&self, order_id: &str) -> Result<bool, StoreError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.claimed.write().await.insert(order_id.to_string()))
    }
}
