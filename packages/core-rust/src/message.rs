//! Device message and response types.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` so they round-trip
//! with the JSON produced by the transport collaborators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BaseMetadata
// ---------------------------------------------------------------------------

/// Identity of the device a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseMetadata {
    /// Product (model) code. Empty when the sender supplied none; it is never
    /// treated as a wildcard.
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub device_code: String,
    /// Originating endpoint, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    /// Destination endpoint, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<String>,
}

// ---------------------------------------------------------------------------
// ThingsMessage
// ---------------------------------------------------------------------------

/// A device message as seen by the dispatch engine.
///
/// The engine only reads `id`, `method` and `metadata.product_code`; the rest
/// is carried through to plugins untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingsMessage {
    /// Trace identity of the message.
    pub id: String,
    /// Dotted method name: `<prefix>.<methodType>.<identifier...>`.
    pub method: String,
    /// Creation time, Unix epoch milliseconds.
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub metadata: BaseMetadata,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ThingsMessage {
    /// Creates a message with the given id, method and product code.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        method: impl Into<String>,
        product_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            metadata: BaseMetadata {
                product_code: product_code.into(),
                ..BaseMetadata::default()
            },
            ..Self::default()
        }
    }

    /// Sets the device code.
    #[must_use]
    pub fn with_device_code(mut self, device_code: impl Into<String>) -> Self {
        self.metadata.device_code = device_code.into();
        self
    }

    /// Sets the creation time in epoch milliseconds.
    #[must_use]
    pub fn with_time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Product code of the originating device.
    #[must_use]
    pub fn product_code(&self) -> &str {
        &self.metadata.product_code
    }
}

// ---------------------------------------------------------------------------
// ThingsResponse
// ---------------------------------------------------------------------------

/// Mutable response object handed to every plugin alongside the message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingsResponse {
    /// Reply to send back, if a handler produced one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reply: Option<ThingsMessage>,
    /// Free-form values plugins share with each other and with the caller.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ThingsResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an attribute, replacing any previous value under `key`.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_deserializes_from_camel_case_json() {
        let json = serde_json::json!({
            "id": "m-1",
            "method": "thing.event.device.online",
            "time": 1_700_000_000_000_u64,
            "metadata": { "productCode": "ProductA", "deviceCode": "dev-9" },
            "payload": { "rssi": -40 }
        });
        let msg: ThingsMessage = serde_json::from_value(json).unwrap();
        assert_eq!(msg.product_code(), "ProductA");
        assert_eq!(msg.metadata.device_code, "dev-9");
        assert!(msg.metadata.source.is_none());
        assert_eq!(msg.payload["rssi"], -40);
    }

    #[test]
    fn missing_product_code_is_empty_not_wildcard() {
        let json = serde_json::json!({ "id": "m-2", "method": "thing.event.x" });
        let msg: ThingsMessage = serde_json::from_value(json).unwrap();
        assert_eq!(msg.product_code(), "");
    }

    #[test]
    fn empty_response_serializes_to_empty_object() {
        let json = serde_json::to_value(ThingsResponse::new()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn response_attributes_overwrite() {
        let mut resp = ThingsResponse::new();
        resp.set_attribute("handled", serde_json::json!(false));
        resp.set_attribute("handled", serde_json::json!(true));
        assert_eq!(resp.attribute("handled"), Some(&serde_json::json!(true)));
        assert_eq!(resp.attributes.len(), 1);
    }
}
