//! Inbound event payloads.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::InputError;

/// How an event reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Object notification wrapped in a push-subscription envelope.
    Push,
    /// Object descriptor posted as-is.
    Direct,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::Push => "push",
            TriggerSource::Direct => "direct",
        }
    }
}

/// The storage object descriptor carried by finalize notifications.
///
/// Only `bucket` and `name` are required; every other field is kept in the
/// raw payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Push-subscription envelope: `{message: {data, attributes, messageId}, subscription}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushEnvelope {
    #[serde(default)]
    pub message: Option<PushMessage>,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushMessage {
    /// Base64 encoded JSON object descriptor.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default, rename = "messageId", alias = "message_id")]
    pub message_id: Option<String>,
}

/// One object-finalized notification, normalised from either trigger.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionEvent {
    pub bucket: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub source: TriggerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// The decoded payload exactly as received.
    #[serde(skip)]
    pub raw: Value,
}

impl ConversionEvent {
    /// Builds an event from a decoded object descriptor.
    pub fn from_object(raw: Value, source: TriggerSource) -> Result<Self, InputError> {
        if !raw.is_object() {
            return Err(InputError::InvalidPayload(
                "expected a JSON object".to_string(),
            ));
        }

        let descriptor: ObjectDescriptor = serde_json::from_value(raw.clone())
            .map_err(|e| InputError::InvalidPayload(e.to_string()))?;

        let bucket = descriptor
            .bucket
            .filter(|b| !b.is_empty())
            .ok_or(InputError::MissingField("bucket"))?;
        let name = descriptor
            .name
            .filter(|n| !n.is_empty())
            .ok_or(InputError::MissingField("name"))?;

        Ok(Self {
            bucket,
            name,
            content_type: descriptor.content_type,
            source,
            message_id: None,
            raw,
        })
    }

    /// Unwraps a push envelope and decodes its base64 JSON payload.
    pub fn from_push_envelope(envelope: &PushEnvelope) -> Result<Self, InputError> {
        let message = envelope
            .message
            .as_ref()
            .ok_or(InputError::MissingMessage)?;
        let data = message
            .data
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(InputError::MissingData)?;

        let bytes = STANDARD
            .decode(data)
            .map_err(|e| InputError::InvalidBase64(e.to_string()))?;
        let raw: Value = serde_json::from_slice(&bytes)
            .map_err(|e| InputError::InvalidPayload(e.to_string()))?;

        let mut event = Self::from_object(raw, TriggerSource::Push)?;
        event.message_id = message.message_id.clone();
        Ok(event)
    }
}
