//! WebSocket envelope DTOs.
//!
//! Every stream frame is a JSON object with a `type` tag. Depending on the
//! tag, the body is in `items` (batches), `payload` or `data` (single items)
//! or `point` (heatmap events). Keep-alive frames (`ping` / `pong`) are not
//! JSON and never decode.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::domain::{HeatPoint, LiveEvent};

/// Batch tags accepted on the visualization stream.
pub const HEATMAP_BATCH_TYPES: &[&str] = &["heatmap.batch", "visualization.batch", "alerts.batch"];

pub const HEATMAP_ADD: &str = "heatmap.add";
pub const HEATMAP_REMOVE: &str = "heatmap.remove";

/// Generic stream envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub items: Option<Vec<Value>>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub point: Option<Value>,
}

impl Envelope {
    /// Parse a text frame. Keep-alive and non-JSON frames yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "ping" || trimmed == "pong" {
            return None;
        }
        match serde_json::from_str(trimmed) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::debug!("Dropping unparsable frame: {}", e);
                None
            }
        }
    }

    /// Body of a single-item envelope: `payload`, else `data`.
    fn body(self) -> Option<Value> {
        self.payload.or(self.data).filter(|v| !v.is_null())
    }
}

/// Unwrap a batch entry that may be wrapped as `{ "payload": item }`.
fn unwrap_payload(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("payload") => {
            map.remove("payload").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(item) => Some(item),
        Err(e) => {
            tracing::debug!("Dropping undecodable item: {}", e);
            None
        }
    }
}

/// Decode a frame of an item feed (alerts, IoT).
///
/// `batch_types` tag envelopes carrying `items`; `item_types` tag envelopes
/// carrying one item in `payload` or `data`. Entries of a batch that do not
/// decode are skipped; a batch with no decodable entry yields `None`.
pub fn decode_item_event<T: DeserializeOwned>(
    text: &str,
    batch_types: &[&str],
    item_types: &[&str],
) -> Option<LiveEvent<T>> {
    let envelope = Envelope::parse(text)?;
    let kind = envelope.kind.as_str();

    if batch_types.contains(&kind) {
        let items: Vec<T> = envelope
            .items?
            .into_iter()
            .map(unwrap_payload)
            .filter(|v| !v.is_null())
            .filter_map(decode_value)
            .collect();
        return (!items.is_empty()).then_some(LiveEvent::Batch(items));
    }

    if item_types.contains(&kind) {
        return envelope.body().and_then(decode_value).map(LiveEvent::Item);
    }

    tracing::debug!("Ignoring frame of type '{}'", kind);
    None
}

/// Decode a frame of the visualization stream.
///
/// Batches become a [`LiveEvent::Sequence`] of their entries, each entry
/// being itself an add or remove envelope.
pub fn decode_heatmap_event(text: &str) -> Option<LiveEvent<HeatPoint>> {
    let envelope = Envelope::parse(text)?;
    decode_heatmap_envelope(envelope)
}

fn decode_heatmap_envelope(envelope: Envelope) -> Option<LiveEvent<HeatPoint>> {
    match envelope.kind.as_str() {
        HEATMAP_ADD => envelope.point.and_then(decode_value).map(LiveEvent::Item),
        HEATMAP_REMOVE => envelope.point.and_then(decode_value).map(LiveEvent::Remove),
        kind if HEATMAP_BATCH_TYPES.contains(&kind) => {
            let events: Vec<_> = envelope
                .items?
                .into_iter()
                .map(unwrap_payload)
                .filter_map(decode_value::<Envelope>)
                .filter_map(decode_heatmap_envelope)
                .collect();
            (!events.is_empty()).then_some(LiveEvent::Sequence(events))
        }
        kind => {
            tracing::debug!("Ignoring visualization frame of type '{}'", kind);
            None
        }
    }
}
