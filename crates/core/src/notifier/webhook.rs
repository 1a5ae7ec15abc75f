//! HTTP webhook notifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Request};
use serde::Serialize;
use tracing::info;

use crate::config::NotifierConfig;

use super::error::NotificationError;
use super::traits::Notifier;

#[derive(Serialize)]
struct CompletionPayload<'a> {
    order: &'a str,
}

/// Posts `{"order": "<id>"}` to a fixed URL tagged with workflow and dashboard IDs.
pub struct WebhookNotifier {
    client: Client,
    config: NotifierConfig,
}

impl WebhookNotifier {
    /// Create a new webhook notifier.
    pub fn new(config: NotifierConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| NotificationError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Builds the webhook request for an order.
    pub fn build_request(&self, order_id: &str) -> Result<Request, NotificationError> {
        self.client
            .post(&self.config.url)
            .query(&[
                ("workflow", self.config.workflow_id.as_str()),
                ("dashboard", self.config.dashboard_id.as_str()),
            ])
            .json(&CompletionPayload { order: order_id })
            .build()
            .map_err(|e| NotificationError::Request(e.to_string()))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, order_id: &str) -> Result<(), NotificationError> {
        let request = self.build_request(order_id)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| NotificationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        info!(order_id, status = status.as_u16(), "Completion webhook delivered");
        Ok(())
    }
}
