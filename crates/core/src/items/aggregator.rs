//! Completion aggregation over an item store.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::filename::FilenameIdentifiers;

use super::error::StoreError;
use super::store::ItemStore;
use super::types::OrderItemRecord;

/// Result of recording one extracted item against its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOutcome {
    /// Approved siblings are still waiting for conversion.
    Incomplete,
    /// The order is complete and this caller owns the notification.
    Complete,
    /// The order is complete but another event already claimed the notification.
    AlreadyNotified,
}

/// Returns whether `order_id` is complete given its items.
///
/// Only items of that order whose status equals `approved_status` count. An
/// order with no such items is not complete.
pub fn order_is_complete(items: &[OrderItemRecord], order_id: &str, approved_status: &str) -> bool {
    let mut approved = items
        .iter()
        .filter(|item| item.order == order_id && item.order_item_status == approved_status)
        .peekable();

    approved.peek().is_some() && approved.all(|item| item.png_extracted)
}

/// Marks items extracted and decides whether their order is complete.
#[derive(Clone)]
pub struct CompletionAggregator {
    store: Arc<dyn ItemStore>,
    approved_status: String,
    exactly_once: bool,
}

impl CompletionAggregator {
    /// Creates an aggregator using `approved_status` as the approved sentinel.
    pub fn new(store: Arc<dyn ItemStore>, approved_status: impl Into<String>) -> Self {
        Self {
            store,
            approved_status: approved_status.into(),
            exactly_once: true,
        }
    }

    /// Enables or disables the order-level notification claim.
    ///
    /// With the claim disabled every sibling that observes a complete order
    /// is allowed to notify.
    pub fn with_exactly_once(mut self, exactly_once: bool) -> Self {
        self.exactly_once = exactly_once;
        self
    }

    /// Flags one item as extracted.
    pub async fn mark_extracted(&self, order_item_id: &str) -> Result<(), StoreError> {
        self.store.mark_extracted(order_item_id).await
    }

    /// Re-reads the order's items and checks completion.
    pub async fn is_order_complete(&self, order_id: &str) -> Result<bool, StoreError> {
        let items = self.store.items_for_order(order_id).await?;
        let complete = order_is_complete(&items, order_id, &self.approved_status);
        debug!(
            order_id,
            items = items.len(),
            complete,
            "Evaluated order completion"
        );
        Ok(complete)
    }

    /// Marks the item extracted, then checks whether its order is now complete.
    pub async fn mark_and_check(&self, ids: &FilenameIdentifiers) -> Result<bool, StoreError> {
        self.mark_extracted(&ids.order_item_id).await?;
        info!(
            order_id = %ids.order_id,
            order_item_id = %ids.order_item_id,
            "Order item marked as extracted"
        );
        self.is_order_complete(&ids.order_id).await
    }

    /// Marks the item extracted and, when the order is complete, claims its
    /// notification.
    pub async fn record_and_check(
        &self,
        ids: &FilenameIdentifiers,
    ) -> Result<AggregationOutcome, StoreError> {
        if !self.mark_and_check(ids).await? {
            return Ok(AggregationOutcome::Incomplete);
        }

        if self.claim_notification(&ids.order_id).await? {
            Ok(AggregationOutcome::Complete)
        } else {
            info!(order_id = %ids.order_id, "Order already notified");
            Ok(AggregationOutcome::AlreadyNotified)
        }
    }

    /// Decides whether this caller should send the completion notification.
    pub async fn claim_notification(&self, order_id: &str) -> Result<bool, StoreError> {
        if !self.exactly_once {
            return Ok(true);
        }
        self.store.claim_notification(order_id).await
    }
}
