//! Firebase Realtime Database item store over its REST API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::RealtimeDbConfig;

use super::{ItemStore, OrderItemRecord, StoreError};

/// Item store backed by a Realtime Database tree:
///
/// ```text
/// {root}/{model_id}/orderItems/{orderItemId}   -> OrderItemRecord
/// {root}/{model_id}/notifiedOrders/{orderId}   -> { notifiedAt }
/// ```
///
/// Sibling lookups use `orderBy="order"`, which needs an `.indexOn: ["order"]`
/// rule on `orderItems`.
pub struct RealtimeDbItemStore {
    client: Client,
    config: RealtimeDbConfig,
}

impl RealtimeDbItemStore {
    /// Create a new Realtime Database item store.
    pub fn new(config: RealtimeDbConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| StoreError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// URL of a node below the model, e.g. `orderItems/I1`.
    pub fn node_url(&self, segments: &[&str]) -> String {
        let mut url = self.config.url.trim_end_matches('/').to_string();
        let prefix = [self.config.root.as_str(), self.config.model_id.as_str()];

        for segment in prefix
            .iter()
            .flat_map(|p| p.split('/'))
            .filter(|s| !s.is_empty())
        {
            url.push('/');
            url.push_str(segment);
        }
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url.push_str(".json");
        url
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        self.with_auth(request)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))
    }

    async fn expect_success(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, StoreError> {
        let response = Self::expect_success(self.send(self.client.get(url)).await?).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Decodes an `orderItems` query result (an object keyed by item ID, or null).
    pub fn parse_items(value: Value) -> Result<Vec<OrderItemRecord>, StoreError> {
        if value.is_null() {
            return Ok(Vec::new());
        }

        let map: HashMap<String, OrderItemRecord> =
            serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))?;

        let mut items: Vec<OrderItemRecord> = map
            .into_iter()
            .map(|(key, mut record)| {
                if record.order_item_id.is_empty() {
                    record.order_item_id = key;
                }
                record
            })
            .collect();
        items.sort_by(|a, b| a.order_item_id.cmp(&b.order_item_id));
        Ok(items)
    }
}

#[async_trait]
impl ItemStore for RealtimeDbItemStore {
    fn name(&self) -> &str {
        "realtime_db"
    }

    async fn mark_extracted(&self, order_item_id: &str) -> Result<(), StoreError> {
        let url = self.node_url(&["orderItems", order_item_id]);

        // PATCH on a missing node would create it
        if self.get_json(&url).await?.is_null() {
            return Err(StoreError::ItemNotFound(order_item_id.to_string()));
        }

        let request = self.client.patch(&url).json(&json!({ "pngExtracted": true }));
        Self::expect_success(self.send(request).await?).await?;
        debug!(order_item_id, "Set pngExtracted");
        Ok(())
    }

    async fn items_for_order(&self, order_id: &str) -> Result<Vec<OrderItemRecord>, StoreError> {
        let url = self.node_url(&["orderItems"]);
        let equal_to = Value::String(order_id.to_string()).to_string();
        let request = self
            .client
            .get(&url)
            .query(&[("orderBy", "\"order\""), ("equalTo", equal_to.as_str())]);

        let response = Self::expect_success(self.send(request).await?).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Self::parse_items(value)
    }

    async fn claim_notification(&self, order_id: &str) -> Result<bool, StoreError> {
        let url = self.node_url(&["notifiedOrders", order_id]);

        let response = self
            .send(self.client.get(&url).header("X-Firebase-ETag", "true"))
            .await?;
        let response = Self::expect_success(response).await?;
        let etag = response
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| StoreError::Decode("missing ETag header".to_string()))?;
        let current: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        if !current.is_null() {
            return Ok(false);
        }

        let request = self
            .client
            .put(&url)
            .header("if-match", etag)
            .json(&json!({ "notifiedAt": Utc::now().to_rfc3339() }));
        let response = self.send(request).await?;

        match response.status() {
            StatusCode::PRECONDITION_FAILED => {
                warn!(order_id, "Notification already claimed by a concurrent event");
                Ok(false)
            }
            _ => {
                Self::expect_success(response).await?;
                Ok(true)
            }
        }
    }
}
