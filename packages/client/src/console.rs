//! A [`MapSurface`] that renders to text lines.

use geojson::{FeatureCollection, Value};
use geolive_canvas::{BoundingBox, MapSurface, Padding, PointLayer, SurfaceError};

/// Console rendering surface.
///
/// Every surface operation is described as one line in an output buffer the
/// caller drains with [`ConsoleSurface::take_output`].
#[derive(Debug, Clone)]
pub struct ConsoleSurface {
    zoom: f64,
    ready: bool,
    clustering: bool,
    output: Vec<String>,
}

impl ConsoleSurface {
    pub fn new(zoom: f64) -> Self {
        Self {
            zoom,
            ready: true,
            clustering: true,
            output: Vec::new(),
        }
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn set_clustering(&mut self, clustering: bool) {
        self.clustering = clustering;
    }

    /// Drain the lines written since the last call
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    fn write(&mut self, line: String) -> Result<(), SurfaceError> {
        if !self.ready {
            return Err(SurfaceError::NotReady);
        }
        self.output.push(line);
        Ok(())
    }
}

fn describe_geometry(value: &Value) -> String {
    match value {
        Value::Point(_) => "point".to_string(),
        Value::LineString(line) => format!("line with {} vertices", line.len()),
        Value::Polygon(rings) => format!(
            "polygon with {} vertices",
            rings.first().map(Vec::len).unwrap_or(0)
        ),
        Value::MultiPolygon(polygons) => format!("multipolygon of {}", polygons.len()),
        Value::MultiLineString(lines) => format!("multiline of {}", lines.len()),
        Value::MultiPoint(points) => format!("{} points", points.len()),
        Value::GeometryCollection(geometries) => {
            format!("collection of {} geometries", geometries.len())
        }
    }
}

fn describe_collection(collection: &FeatureCollection) -> String {
    let parts: Vec<String> = collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .map(|g| describe_geometry(&g.value))
        .collect();
    if parts.is_empty() {
        "nothing".to_string()
    } else {
        parts.join(", ")
    }
}

impl MapSurface for ConsoleSurface {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn supports_clustering(&self) -> bool {
        self.clustering
    }

    fn fit_bounds(&mut self, bbox: BoundingBox, padding: Padding) -> Result<(), SurfaceError> {
        let (sw, ne) = (bbox.south_west(), bbox.north_east());
        self.write(format!(
            "camera: [{:.5}, {:.5}] - [{:.5}, {:.5}] (padding {}x{})",
            sw.lng, sw.lat, ne.lng, ne.lat, padding.x, padding.y
        ))
    }

    fn set_preview_geometry(&mut self, boundary: &FeatureCollection) -> Result<(), SurfaceError> {
        let line = format!("boundary: {}", describe_collection(boundary));
        self.write(line)
    }

    fn clear_preview_geometry(&mut self) -> Result<(), SurfaceError> {
        self.write("boundary: cleared".to_string())
    }

    fn clear_features(&mut self) -> Result<(), SurfaceError> {
        self.write("features: cleared".to_string())
    }

    fn add_polygons(&mut self, polygons: &FeatureCollection) -> Result<(), SurfaceError> {
        let line = format!("features: {}", describe_collection(polygons));
        self.write(line)
    }

    fn add_markers(&mut self, markers: &PointLayer) -> Result<(), SurfaceError> {
        let line = match markers {
            PointLayer::Clustered(clusters) => format!(
                "markers: {} clusters of {} points",
                clusters.len(),
                markers.point_count()
            ),
            PointLayer::Plain(points) => format!("markers: {} points", points.len()),
        };
        self.write(line)
    }
}
