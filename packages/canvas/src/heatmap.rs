//! Heatmap summary: point count and bounds.

use crate::geometry::{BoundingBox, LngLat, bounding_box_of_points};

/// Point count and bounds of a heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapSummary {
    pub count: usize,
    pub bounds: Option<BoundingBox>,
}

impl HeatmapSummary {
    pub fn from_points(points: &[LngLat]) -> Self {
        Self {
            count: points.len(),
            bounds: bounding_box_of_points(points.iter().copied()),
        }
    }

    /// One-line description, e.g. `Points: 2 Bounds: [28.600,77.200] - [28.650,77.260]`.
    pub fn describe(&self) -> String {
        match &self.bounds {
            Some(b) => format!(
                "Points: {} Bounds: [{:.3},{:.3}] - [{:.3},{:.3}]",
                self.count, b.min_lat, b.min_lng, b.max_lat, b.max_lng
            ),
            None => format!("Points: {}", self.count),
        }
    }
}
