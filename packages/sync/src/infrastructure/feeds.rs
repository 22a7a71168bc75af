//! The backend's three live feeds.

use std::time::Duration;

use crate::{
    domain::{AlertItem, Feed, FeedEndpoint, HeatPoint, IotReading, LiveEvent, SubscriptionConfig},
    infrastructure::dto::websocket::{decode_heatmap_event, decode_item_event},
};

/// Default number of points requested and kept by the heatmap feed.
pub const HEATMAP_LIMIT: usize = 500;

/// Capacity of the heatmap collection.
pub const HEATMAP_CAPACITY: usize = 1000;

/// Period of the heatmap snapshot re-fetch.
pub const HEATMAP_REFETCH_INTERVAL: Duration = Duration::from_secs(15);

/// Alerts raised by the backend (`/alerts/`, `/alerts/ws`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertsFeed;

impl Feed for AlertsFeed {
    type Item = AlertItem;

    fn name(&self) -> &'static str {
        "alerts"
    }

    fn snapshot_endpoint(&self) -> FeedEndpoint {
        FeedEndpoint::new("alerts/")
    }

    fn stream_endpoint(&self) -> FeedEndpoint {
        FeedEndpoint::new("alerts/ws")
    }

    fn decode(&self, text: &str) -> Option<LiveEvent<AlertItem>> {
        decode_item_event(
            text,
            &["alerts.batch"],
            &["alert.created", "alerts.created", "alerts"],
        )
    }
}

/// IoT sensor readings, optionally scoped to one sensor (`/iot/`, `/iot/ws`).
#[derive(Debug, Clone, Default)]
pub struct IotFeed {
    sensor: Option<String>,
}

impl IotFeed {
    pub fn new(sensor: Option<String>) -> Self {
        Self {
            sensor: sensor.filter(|s| !s.is_empty()),
        }
    }

    pub fn sensor(&self) -> Option<&str> {
        self.sensor.as_deref()
    }
}

impl Feed for IotFeed {
    type Item = IotReading;

    fn name(&self) -> &'static str {
        "iot"
    }

    fn snapshot_endpoint(&self) -> FeedEndpoint {
        FeedEndpoint::new("iot/").with_optional_param("sensor", self.sensor())
    }

    fn stream_endpoint(&self) -> FeedEndpoint {
        FeedEndpoint::new("iot/ws").with_optional_param("sensor", self.sensor())
    }

    fn decode(&self, text: &str) -> Option<LiveEvent<IotReading>> {
        decode_item_event(text, &["iot.batch"], &["iot", "iot.created"])
    }
}

/// Heatmap points (`/visualization/heatmap`, `/visualization/ws`).
///
/// The only feed with periodic snapshot re-fetch and removals.
#[derive(Debug, Clone, Copy)]
pub struct HeatmapFeed {
    limit: usize,
}

impl HeatmapFeed {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Default for HeatmapFeed {
    fn default() -> Self {
        Self::new(HEATMAP_LIMIT)
    }
}

impl Feed for HeatmapFeed {
    type Item = HeatPoint;

    fn name(&self) -> &'static str {
        "heatmap"
    }

    fn snapshot_endpoint(&self) -> FeedEndpoint {
        FeedEndpoint::new("visualization/heatmap").with_param("limit", self.limit.to_string())
    }

    fn stream_endpoint(&self) -> FeedEndpoint {
        FeedEndpoint::new("visualization/ws")
    }

    fn decode(&self, text: &str) -> Option<LiveEvent<HeatPoint>> {
        decode_heatmap_event(text)
    }

    fn default_config(&self) -> SubscriptionConfig {
        SubscriptionConfig {
            capacity: HEATMAP_CAPACITY,
            refetch_interval: Some(HEATMAP_REFETCH_INTERVAL),
            ..SubscriptionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iot_sensor_scopes_both_endpoints() {
        // テスト項目: センサー指定はスナップショットとストリームの両方に付与される
        // given (前提条件):
        let feed = IotFeed::new(Some("pm25".to_string()));

        // when (操作):
        let snapshot = feed.snapshot_endpoint();
        let stream = feed.stream_endpoint();

        // then (期待する結果):
        let scope = vec![("sensor".to_string(), "pm25".to_string())];
        assert_eq!(snapshot.query, scope);
        assert_eq!(stream.query, scope);
        assert!(IotFeed::new(Some(String::new())).stream_endpoint().query.is_empty());
    }

    #[test]
    fn test_default_configs() {
        // テスト項目: 容量と再取得間隔の既定値はフィードごとに異なる
        // given (前提条件) / when (操作) / then (期待する結果):
        let alerts = AlertsFeed.default_config();
        assert_eq!(alerts.capacity, 500);
        assert_eq!(alerts.refetch_interval, None);
        assert_eq!(alerts.keepalive_interval, Duration::from_secs(30));

        let heatmap = HeatmapFeed::default().default_config();
        assert_eq!(heatmap.capacity, 1000);
        assert_eq!(heatmap.refetch_interval, Some(Duration::from_secs(15)));
        assert_eq!(
            HeatmapFeed::default().snapshot_endpoint().query,
            vec![("limit".to_string(), "500".to_string())]
        );
    }

    #[test]
    fn test_iot_frames_decode() {
        // テスト項目: IoT の "iot" フレームは data を単一アイテムとして解釈する
        // given (前提条件):
        let text = r#"{"type":"iot","data":{"id":"r1","sensor":"pm25","value":12}}"#;

        // when (操作):
        let event = IotFeed::default().decode(text);

        // then (期待する結果):
        assert!(matches!(event, Some(LiveEvent::Item(r)) if r.id == "r1"));
    }

    #[test]
    fn test_plain_alerts_frames_decode() {
        // テスト項目: "alerts" フレームは payload と data のどちらも単一アイテムとして解釈する
        // given (前提条件):
        let with_payload = r#"{"type":"alerts","payload":{"id":"x","type":"info"}}"#;
        let with_data = r#"{"type":"alerts","data":{"id":"y","type":"warning"}}"#;

        // when (操作):
        let from_payload = AlertsFeed.decode(with_payload);
        let from_data = AlertsFeed.decode(with_data);

        // then (期待する結果):
        assert!(matches!(from_payload, Some(LiveEvent::Item(a)) if a.id == "x"));
        assert!(matches!(from_data, Some(LiveEvent::Item(a)) if a.id == "y" && a.kind == "warning"));
    }
}
