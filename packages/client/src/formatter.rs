//! Feed formatting utilities for console display.

use geolive_canvas::{LngLat, heatmap::HeatmapSummary};
use geolive_shared::time::timestamp_to_clock_label;
use geolive_sync::{AlertItem, ConnectionPhase, FeedState, HeatPoint, IotReading, IotValue};

/// Number of items printed under a feed's status line
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Feed formatter for console display
pub struct FeedFormatter;

impl FeedFormatter {
    /// Human label of a connection phase
    pub fn phase_label(phase: ConnectionPhase) -> &'static str {
        match phase {
            ConnectionPhase::Idle => "idle",
            ConnectionPhase::Connecting => "connecting",
            ConnectionPhase::Connected => "live",
            ConnectionPhase::Disconnected => "disconnected",
        }
    }

    /// Format the status line of a feed
    ///
    /// e.g. `[alerts] live | 3 items | updated 12:00:00 UTC`
    pub fn format_status<T>(name: &str, state: &FeedState<T>) -> String
    where
        T: geolive_sync::FeedItem,
    {
        let mut line = format!(
            "[{}] {} | {} items",
            name,
            Self::phase_label(state.phase()),
            state.items().len()
        );
        if let Some(updated) = state.last_updated() {
            line.push_str(&format!(" | updated {} UTC", timestamp_to_clock_label(updated)));
        }
        if let Some(error) = state.last_error() {
            line.push_str(&format!(" | error: {}", error));
        }
        line
    }

    /// Format one alert
    ///
    /// e.g. `[critical] Depth exceeded @ Block 7 (2.50 ha) 2024-01-01T00:00:00Z`
    pub fn format_alert(alert: &AlertItem) -> String {
        let mut line = format!(
            "[{}] {}",
            alert.kind,
            alert.title.as_deref().unwrap_or("(untitled)")
        );
        if let Some(location) = &alert.location {
            line.push_str(&format!(" @ {}", location));
        }
        if let Some(area) = alert.area {
            line.push_str(&format!(" ({:.2} ha)", area));
        }
        if let Some(created_at) = &alert.created_at {
            line.push_str(&format!(" {}", created_at));
        }
        if alert.acknowledged == Some(true) {
            line.push_str(" (ack)");
        }
        line
    }

    /// Format one IoT reading
    ///
    /// e.g. `pm25 = 12.5 ug/m3 at 2024-01-01T00:00:00Z`
    pub fn format_reading(reading: &IotReading) -> String {
        let value = match &reading.value {
            Some(IotValue::Number(n)) => n.to_string(),
            Some(IotValue::Text(t)) => t.clone(),
            None => "-".to_string(),
        };
        let mut line = format!(
            "{} = {}",
            reading.sensor.as_deref().unwrap_or(&reading.id),
            value
        );
        if let Some(unit) = &reading.unit {
            line.push_str(&format!(" {}", unit));
        }
        if let Some(timestamp) = &reading.timestamp {
            line.push_str(&format!(" at {}", timestamp));
        }
        line
    }

    /// Format a heatmap as its point count and bounds
    pub fn format_heatmap(points: &[HeatPoint]) -> String {
        let positions: Vec<LngLat> = points.iter().map(|p| LngLat::new(p.lng, p.lat)).collect();
        HeatmapSummary::from_points(&positions).describe()
    }

    /// Status line followed by the first `limit` items
    pub fn format_feed<T>(
        name: &str,
        state: &FeedState<T>,
        limit: usize,
        item: impl Fn(&T) -> String,
    ) -> String
    where
        T: geolive_sync::FeedItem,
    {
        let mut output = Self::format_status(name, state);
        output.push('\n');
        for entry in state.items().iter().take(limit) {
            output.push_str(&format!("  {}\n", item(entry)));
        }
        let hidden = state.items().len().saturating_sub(limit);
        if hidden > 0 {
            output.push_str(&format!("  ... and {} more\n", hidden));
        }
        output
    }
}
