//! Pure geometry helpers: bounding boxes, rings and projections.
//!
//! Coordinates are always `[longitude, latitude]`, as in GeoJSON.

use std::f64::consts::PI;

use geojson::{GeoJson, Geometry, Value};
use serde_json::Value as JsonValue;

/// Side length of one Web-Mercator tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web-Mercator projection, as a sine.
const MAX_SIN_LAT: f64 = 0.9999;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Read the first two components of a GeoJSON position.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some(Self::new(*lng, *lat)),
            _ => None,
        }
    }

    /// GeoJSON position `[lng, lat]`.
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }
}

/// A point in screen or world pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Pixel) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned box in longitude/latitude space.
///
/// Invariant: `min_lng <= max_lng` and `min_lat <= max_lat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Box around a single coordinate.
    pub fn around(point: LngLat) -> Self {
        Self {
            min_lng: point.lng,
            min_lat: point.lat,
            max_lng: point.lng,
            max_lat: point.lat,
        }
    }

    /// Build from `[min_lng, min_lat, max_lng, max_lat]`, swapping reversed axes.
    pub fn from_array(bbox: [f64; 4]) -> Self {
        let [a, b, c, d] = bbox;
        Self {
            min_lng: a.min(c),
            min_lat: b.min(d),
            max_lng: a.max(c),
            max_lat: b.max(d),
        }
    }

    /// South-west corner.
    pub fn south_west(&self) -> LngLat {
        LngLat::new(self.min_lng, self.min_lat)
    }

    /// North-east corner.
    pub fn north_east(&self) -> LngLat {
        LngLat::new(self.max_lng, self.max_lat)
    }

    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn contains(&self, point: LngLat) -> bool {
        point.lng >= self.min_lng
            && point.lng <= self.max_lng
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }

    /// Grow the box so it contains `point`.
    pub fn extend(&mut self, point: LngLat) {
        self.min_lng = self.min_lng.min(point.lng);
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lng = self.max_lng.max(point.lng);
        self.max_lat = self.max_lat.max(point.lat);
    }

    /// Grow each side by `fraction` of the box's extent on that axis.
    pub fn pad(&self, fraction: f64) -> Self {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            min_lng: self.min_lng - dx,
            min_lat: self.min_lat - dy,
            max_lng: self.max_lng + dx,
            max_lat: self.max_lat + dy,
        }
    }
}

#[derive(Default)]
struct BoundsAccumulator {
    bbox: Option<BoundingBox>,
}

impl BoundsAccumulator {
    fn push(&mut self, point: LngLat) {
        match self.bbox.as_mut() {
            Some(bbox) => bbox.extend(point),
            None => self.bbox = Some(BoundingBox::around(point)),
        }
    }

    fn push_position(&mut self, position: &[f64]) {
        if let Some(point) = LngLat::from_position(position) {
            self.push(point);
        }
    }

    fn push_geometry(&mut self, geometry: &Geometry) {
        match &geometry.value {
            Value::Point(p) => self.push_position(p),
            Value::MultiPoint(ps) | Value::LineString(ps) => {
                ps.iter().for_each(|p| self.push_position(p))
            }
            Value::MultiLineString(lines) | Value::Polygon(lines) => lines
                .iter()
                .flatten()
                .for_each(|p| self.push_position(p)),
            Value::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .flatten()
                .for_each(|p| self.push_position(p)),
            Value::GeometryCollection(geometries) => {
                geometries.iter().for_each(|g| self.push_geometry(g))
            }
        }
    }

    /// Walk an arbitrary coordinate tree. Anything that is not an array of
    /// numbers or an array of arrays is ignored.
    fn push_json_coordinates(&mut self, coordinates: &JsonValue) {
        let Some(items) = coordinates.as_array() else {
            return;
        };
        if let (Some(lng), Some(lat)) = (
            items.first().and_then(JsonValue::as_f64),
            items.get(1).and_then(JsonValue::as_f64),
        ) {
            self.push(LngLat::new(lng, lat));
            return;
        }
        items.iter().for_each(|c| self.push_json_coordinates(c));
    }

    fn push_json_geometry(&mut self, geometry: &JsonValue) -> Option<()> {
        if geometry.is_null() {
            return Some(());
        }
        match geometry.get("type").and_then(JsonValue::as_str) {
            Some("GeometryCollection") => {
                for g in geometry.get("geometries")?.as_array()? {
                    self.push_json_geometry(g)?;
                }
            }
            _ => self.push_json_coordinates(geometry.get("coordinates")?),
        }
        Some(())
    }

    fn finish(self) -> Option<BoundingBox> {
        self.bbox
    }
}

/// Bounding box of a geometry, a feature or a feature collection.
///
/// Returns `None` when the input holds no coordinate pair.
pub fn bounding_box_of(geojson: &GeoJson) -> Option<BoundingBox> {
    let mut acc = BoundsAccumulator::default();
    match geojson {
        GeoJson::Geometry(geometry) => acc.push_geometry(geometry),
        GeoJson::Feature(feature) => {
            if let Some(geometry) = &feature.geometry {
                acc.push_geometry(geometry);
            }
        }
        GeoJson::FeatureCollection(collection) => collection
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .for_each(|g| acc.push_geometry(g)),
    }
    acc.finish()
}

/// Bounding box of untyped GeoJSON-like JSON.
///
/// Accepts a geometry, a feature, a feature collection or a bare coordinate
/// tree. Malformed input (e.g. `features` that is not an array) yields `None`
/// rather than an error.
pub fn bounding_box_of_value(value: &JsonValue) -> Option<BoundingBox> {
    let mut acc = BoundsAccumulator::default();
    match value.get("type").and_then(JsonValue::as_str) {
        Some("FeatureCollection") => {
            for feature in value.get("features")?.as_array()? {
                acc.push_json_geometry(feature.get("geometry").unwrap_or(&JsonValue::Null))?;
            }
        }
        Some("Feature") => {
            acc.push_json_geometry(value.get("geometry").unwrap_or(&JsonValue::Null))?
        }
        Some(_) => acc.push_json_geometry(value)?,
        None => acc.push_json_coordinates(value),
    }
    acc.finish()
}

/// Bounding box of a set of points.
pub fn bounding_box_of_points(points: impl IntoIterator<Item = LngLat>) -> Option<BoundingBox> {
    let mut acc = BoundsAccumulator::default();
    points.into_iter().for_each(|p| acc.push(p));
    acc.finish()
}

/// Append the first vertex when `should_close` is set and there are at least
/// three vertices. Otherwise the vertices are returned unchanged.
pub fn close_ring(vertices: &[LngLat], should_close: bool) -> Vec<LngLat> {
    let mut ring = vertices.to_vec();
    if should_close
        && vertices.len() >= 3
        && let Some(first) = vertices.first()
    {
        ring.push(*first);
    }
    ring
}

/// Kind of geometry a vertex sequence can be drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingKind {
    LineString,
    Polygon,
}

/// Classify a vertex sequence: fewer than two vertices draw nothing, two or
/// three draw a line, four or more (a closed ring) draw a polygon.
pub fn classify_ring_geometry(vertices: &[LngLat]) -> Option<RingKind> {
    match vertices.len() {
        0 | 1 => None,
        2 | 3 => Some(RingKind::LineString),
        _ => Some(RingKind::Polygon),
    }
}

/// Geometry for a vertex sequence, following [`classify_ring_geometry`].
pub fn ring_geometry(vertices: &[LngLat]) -> Option<Geometry> {
    let positions: Vec<Vec<f64>> = vertices.iter().map(|v| v.to_position()).collect();
    let value = match classify_ring_geometry(vertices)? {
        RingKind::LineString => Value::LineString(positions),
        RingKind::Polygon => Value::Polygon(vec![positions]),
    };
    Some(Geometry::new(value))
}

/// Perspective projection of a coordinate on a sphere of `reference_radius`
/// pixels centred on `center`.
///
/// The point facing the viewer (`0°, 0°`) keeps scale 1; the far side shrinks
/// towards scale 1/3. A non-positive radius collapses everything onto `center`.
pub fn project(lng: f64, lat: f64, center: Pixel, reference_radius: f64) -> Pixel {
    if reference_radius <= 0.0 || !reference_radius.is_finite() {
        return center;
    }
    let r = reference_radius;
    let (lng, lat) = (lng.to_radians(), lat.to_radians());
    let x = r * lat.cos() * lng.sin();
    let y = -r * lat.sin();
    // depth in [0, 2r], 0 at the point facing the viewer
    let z = r * (1.0 - lat.cos() * lng.cos());
    let scale = r / (r + z);
    Pixel::new(center.x + x * scale, center.y + y * scale)
}

/// Web-Mercator world pixel coordinate of `point` at `zoom`.
pub fn lnglat_to_world(point: LngLat, zoom: f64) -> Pixel {
    let size = TILE_SIZE * zoom.exp2();
    let sin_lat = point.lat.to_radians().sin().clamp(-MAX_SIN_LAT, MAX_SIN_LAT);
    let x = (point.lng + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * size;
    Pixel::new(x, y)
}

/// Inverse of [`lnglat_to_world`].
pub fn world_to_lnglat(pixel: Pixel, zoom: f64) -> LngLat {
    let size = TILE_SIZE * zoom.exp2();
    let lng = pixel.x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * pixel.y / size;
    let lat = n.sinh().atan().to_degrees();
    LngLat::new(lng, lat)
}
