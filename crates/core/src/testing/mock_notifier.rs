//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{NotificationError, Notifier};

/// Mock implementation of the Notifier trait. Records every order notified.
#[derive(Debug, Default)]
pub struct MockNotifier {
    calls: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<NotificationError>>>,
}

impl MockNotifier {
    /// Create a new mock notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders passed to `notify`, in call order, including failed calls.
    pub async fn notified_orders(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    /// Configure the next notification to fail with the given error.
    pub async fn set_next_error(&self, error: NotificationError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn notify(&self, order_id: &str) -> Result<(), NotificationError> {
        self.calls.write().await.push(order_id.to_string());
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
