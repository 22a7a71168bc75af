//! Rendering surface the canvas draws onto.
//!
//! A surface wraps a concrete map widget. It owns two layers: the boundary
//! layer (driven through the preview operations) and the feature layer
//! (polygons plus point markers).

use geojson::FeatureCollection;
use thiserror::Error;

use crate::{cluster::PointLayer, geometry::BoundingBox};

/// Errors reported by a rendering surface
#[derive(Debug, Error, PartialEq)]
pub enum SurfaceError {
    /// The underlying map has not been initialized yet
    #[error("Map surface is not initialized")]
    NotReady,

    /// The underlying map rejected the operation
    #[error("Map surface rejected operation: {0}")]
    Rejected(String),
}

/// Camera padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub x: f64,
    pub y: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self { x: 20.0, y: 20.0 }
    }
}

/// Operations the canvas needs from a map widget.
#[cfg_attr(test, mockall::automock)]
pub trait MapSurface {
    /// Whether the map has been created and can be manipulated.
    fn is_ready(&self) -> bool;

    /// Current zoom level.
    fn zoom(&self) -> f64;

    /// Whether the widget can render aggregated cluster markers.
    fn supports_clustering(&self) -> bool;

    /// Frame the camera on `bbox` with `padding`.
    fn fit_bounds(&mut self, bbox: BoundingBox, padding: Padding) -> Result<(), SurfaceError>;

    /// Replace the boundary layer contents with `boundary`.
    fn set_preview_geometry(&mut self, boundary: &FeatureCollection) -> Result<(), SurfaceError>;

    /// Remove everything from the boundary layer.
    fn clear_preview_geometry(&mut self) -> Result<(), SurfaceError>;

    /// Remove all polygons and markers from the feature layer.
    fn clear_features(&mut self) -> Result<(), SurfaceError>;

    /// Add filled polygons (any non-point geometry) to the feature layer.
    fn add_polygons(&mut self, polygons: &FeatureCollection) -> Result<(), SurfaceError>;

    /// Add point markers to the feature layer.
    fn add_markers(&mut self, markers: &PointLayer) -> Result<(), SurfaceError>;
}
