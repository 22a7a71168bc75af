//! In-progress boundary drawing state.

use geojson::{Feature, FeatureCollection};

use crate::geometry::{LngLat, close_ring, ring_geometry};

/// Minimum number of distinct vertices a finished boundary needs.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Vertices clicked so far and whether clicks currently add vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawState {
    vertices: Vec<LngLat>,
    active: bool,
}

impl DrawState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Flip the active flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    pub fn vertices(&self) -> &[LngLat] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn push(&mut self, vertex: LngLat) {
        self.vertices.push(vertex);
    }

    /// Remove and return the most recent vertex.
    pub fn pop(&mut self) -> Option<LngLat> {
        self.vertices.pop()
    }

    /// Drop all vertices. The active flag is left as is.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Whether the vertices can be closed into a polygon.
    pub fn can_finish(&self) -> bool {
        let mut distinct: Vec<LngLat> = Vec::with_capacity(MIN_POLYGON_VERTICES);
        for vertex in &self.vertices {
            if !distinct.contains(vertex) {
                distinct.push(*vertex);
                if distinct.len() >= MIN_POLYGON_VERTICES {
                    return true;
                }
            }
        }
        false
    }

    /// Boundary collection for the current vertices, open or closed.
    pub fn to_collection(&self, close: bool) -> FeatureCollection {
        boundary_collection(&self.vertices, close)
    }
}

/// Feature collection holding the boundary drawn from `vertices`.
///
/// Empty when the vertices do not form a drawable geometry.
pub fn boundary_collection(vertices: &[LngLat], close: bool) -> FeatureCollection {
    let ring = close_ring(vertices, close);
    let features = ring_geometry(&ring)
        .map(|geometry| Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(Default::default()),
            foreign_members: None,
        })
        .into_iter()
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// An empty feature collection.
pub fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}
