//! SQLite-backed item store implementation.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};

use super::{ItemStore, OrderItemRecord, StoreError};

/// SQLite-backed item store.
///
/// Used for local deployments and tests. The notification claim is an
/// `INSERT OR IGNORE` on a primary key, which SQLite applies atomically.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Create a new SQLite item store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite item store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS order_items (
                order_item_id TEXT PRIMARY KEY,
                order_id TEXT NOT NULL,
                order_item_status TEXT NOT NULL,
                png_extracted INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items(order_id);

            CREATE TABLE IF NOT EXISTS notified_orders (
                order_id TEXT PRIMARY KEY,
                notified_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(format!("connection lock poisoned: {}", e)))
    }

    /// Inserts or replaces an item. Items are owned by the order system; this
    /// exists to seed local databases.
    pub fn upsert_item(&self, record: &OrderItemRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO order_items (order_item_id, order_id, order_item_status, png_extracted, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(order_item_id) DO UPDATE SET
                order_id = excluded.order_id,
                order_item_status = excluded.order_item_status,
                png_extracted = excluded.png_extracted,
                updated_at = excluded.updated_at
            "#,
            params![
                record.order_item_id,
                record.order,
                record.order_item_status,
                record.png_extracted,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a single item by ID.
    pub fn get_item(&self, order_item_id: &str) -> Result<Option<OrderItemRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT order_item_id, order_id, order_item_status, png_extracted
             FROM order_items WHERE order_item_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![order_item_id], Self::row_to_record)?;
        let record = rows.next().transpose()?;
        Ok(record)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<OrderItemRecord> {
        Ok(OrderItemRecord {
            order_item_id: row.get(0)?,
            order: row.get(1)?,
            order_item_status: row.get(2)?,
            png_extracted: row.get(3)?,
        })
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn mark_extracted(&self, order_item_id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE order_items SET png_extracted = 1, updated_at = ?1 WHERE order_item_id = ?2",
            params![Utc::now().to_rfc3339(), order_item_id],
        )?;

        if updated == 0 {
            return Err(StoreError::ItemNotFound(order_item_id.to_string()));
        }
        Ok(())
    }

    async fn items_for_order(&self, order_id: &str) -> Result<Vec<OrderItemRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT order_item_id, order_id, order_item_status, png_extracted
             FROM order_items WHERE order_id = ?1 ORDER BY order_item_id",
        )?;
        let items = stmt
            .query_map(params![order_id], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    async fn claim_notification(&self, order_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO notified_orders (order_id, notified_at) VALUES (?1, ?2)",
            params![order_id, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded() -> SqliteItemStore {
        let store = SqliteItemStore::in_memory().unwrap();
        store
            .upsert_item(&OrderItemRecord::new("I1", "O100", "approved"))
            .unwrap();
        store
            .upsert_item(&OrderItemRecord::new("I2", "O100", "approved").extracted(true))
            .unwrap();
        store
            .upsert_item(&OrderItemRecord::new("I3", "O200", "approved"))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_items_for_order_filters_by_order() {
        let store = seeded();
        let items = store.items_for_order("O100").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].order_item_id, "I1");
        assert!(!items[0].png_extracted);
        assert!(items[1].png_extracted);

        assert!(store.items_for_order("O999").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_extracted() {
        let store = seeded();
        store.mark_extracted("I1").await.unwrap();
        assert!(store.get_item("I1").unwrap().unwrap().png_extracted);

        // Marking again is harmless
        store.mark_extracted("I1").await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_missing_item_does_not_create_it() {
        let store = seeded();
        let err = store.mark_extracted("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::ItemNotFound(_)));
        assert!(store.get_item("ghost").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_notification_once_per_order() {
        let store = seeded();
        assert!(store.claim_notification("O100").await.unwrap());
        assert!(!store.claim_notification("O100").await.unwrap());
        assert!(store.claim_notification("O200").await.unwrap());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.db");

        {
            let store = SqliteItemStore::new(&path).unwrap();
            store
                .upsert_item(&OrderItemRecord::new("I1", "O1", "approved"))
                .unwrap();
            store.mark_extracted("I1").await.unwrap();
            assert!(store.claim_notification("O1").await.unwrap());
        }

        let store = SqliteItemStore::new(&path).unwrap();
        assert!(store.get_item("I1").unwrap().unwrap().png_extracted);
        assert!(!store.claim_notification("O1").await.unwrap());
    }
}
