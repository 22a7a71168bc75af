//! Interactive map canvas and the geometry it is built on.
//!
//! The canvas never talks to a concrete map library. It drives a
//! [`surface::MapSurface`] implementation, which keeps the drawing and
//! clustering logic testable without a renderer.

pub mod canvas;
pub mod cluster;
pub mod draw;
pub mod geometry;
pub mod heatmap;
pub mod surface;

pub use canvas::{CanvasOptions, DrawListener, MapCanvas, MapFeature};
pub use cluster::{Cluster, ClusterOptions, PointLayer};
pub use draw::DrawState;
pub use geometry::{BoundingBox, LngLat, Pixel, RingKind};
pub use surface::{MapSurface, Padding, SurfaceError};
