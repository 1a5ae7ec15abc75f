//! Order item record types.

use serde::{Deserialize, Serialize};

/// An order item as held in the external store.
///
/// Field names follow the store's camelCase document layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRecord {
    /// Item identifier. Realtime Database documents carry it as their key.
    #[serde(default)]
    pub order_item_id: String,
    /// Identifier of the owning order.
    pub order: String,
    /// Workflow status of the item.
    #[serde(default)]
    pub order_item_status: String,
    /// Whether the item's image has been rendered and uploaded.
    #[serde(default)]
    pub png_extracted: bool,
}

impl OrderItemRecord {
    /// Creates a record that has not been extracted yet.
    pub fn new(
        order_item_id: impl Into<String>,
        order: impl Into<String>,
        order_item_status: impl Into<String>,
    ) -> Self {
        Self {
            order_item_id: order_item_id.into(),
            order: order.into(),
            order_item_status: order_item_status.into(),
            png_extracted: false,
        }
    }

    /// Sets the extracted flag.
    pub fn extracted(mut self, png_extracted: bool) -> Self {
        self.png_extracted = png_extracted;
        self
    }
}
