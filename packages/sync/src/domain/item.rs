//! Items carried by the alerts, IoT and heatmap feeds.

use std::fmt::Debug;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// Coordinate tolerance, in degrees, for matching a heatmap removal.
pub const REMOVE_TOLERANCE: f64 = 1e-4;

/// An element of a feed's collection.
pub trait FeedItem: Clone + Debug + Send + Sync + DeserializeOwned + 'static {
    /// Whether `self` is what a removal event carrying `probe` refers to.
    ///
    /// Items without a removal event never match.
    fn matches_removal(&self, _probe: &Self) -> bool {
        false
    }
}

fn default_alert_kind() -> String {
    "info".to_string()
}

/// An alert raised by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertItem {
    pub id: String,
    /// Severity or category, e.g. `info`, `warning`, `critical`, `violation`
    #[serde(rename = "type", default = "default_alert_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedItem for AlertItem {}

/// An IoT measurement value, numeric or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IotValue {
    Number(f64),
    Text(String),
}

/// One IoT sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IotReading {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<IotValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedItem for IotReading {}

/// A weighted heatmap point.
///
/// The producer assigns no identifiers, so removals match by coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub intensity: f64,
}

impl HeatPoint {
    pub fn new(lat: f64, lng: f64, intensity: f64) -> Self {
        Self {
            lat,
            lng,
            intensity,
        }
    }
}

impl FeedItem for HeatPoint {
    fn matches_removal(&self, probe: &Self) -> bool {
        (self.lat - probe.lat).abs() < REMOVE_TOLERANCE
            && (self.lng - probe.lng).abs() < REMOVE_TOLERANCE
    }
}
