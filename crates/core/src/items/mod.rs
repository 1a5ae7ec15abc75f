//! Order item tracking and completion aggregation.
//!
//! Each converted document belongs to one order item. After a conversion the
//! item is flagged as extracted and the order is re-evaluated: it is complete
//! when it has at least one item in the approved state and every approved
//! item has been extracted.
//!
//! Completion is derived fresh from the store on every check. Sibling items
//! finishing at the same moment can all observe a complete order; the
//! order-level notification claim (`ItemStore::claim_notification`) is what
//! keeps the webhook to a single call per order.

mod aggregator;
mod error;
mod realtime_db;
mod sqlite;
mod store;
mod types;

pub use aggregator::{order_is_complete, AggregationOutcome, CompletionAggregator};
pub use error::StoreError;
pub use realtime_db::RealtimeDbItemStore;
pub use sqlite::SqliteItemStore;
pub use store::ItemStore;
pub use types::OrderItemRecord;
