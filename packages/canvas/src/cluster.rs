//! Greedy distance-based clustering of point markers.
//!
//! Points are projected to Web-Mercator pixels at the current zoom and joined
//! to the first cluster whose seed lies within the cluster radius. A spatial
//! grid with one cell per radius keeps the lookup close to linear.

use std::collections::HashMap;

use crate::geometry::{
    BoundingBox, LngLat, Pixel, bounding_box_of_points, lnglat_to_world, world_to_lnglat,
};

/// Clustering options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    /// Maximum pixel distance between a cluster seed and its members
    pub radius_px: f64,
    /// Point count from which markers are clustered at all
    pub min_points: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius_px: 80.0,
            min_points: 50,
        }
    }
}

/// Aggregate marker standing for one or more nearby points.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Members' mean world pixel, projected back to longitude/latitude
    pub center: LngLat,
    pub members: Vec<LngLat>,
    pub bounds: BoundingBox,
}

impl Cluster {
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Markers handed to the surface's point layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PointLayer {
    Clustered(Vec<Cluster>),
    Plain(Vec<LngLat>),
}

impl PointLayer {
    /// Number of underlying points.
    pub fn point_count(&self) -> usize {
        match self {
            Self::Clustered(clusters) => clusters.iter().map(Cluster::count).sum(),
            Self::Plain(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}

struct Seed {
    pixel: Pixel,
    sum: Pixel,
    members: Vec<LngLat>,
}

fn cell_of(pixel: Pixel, cell_size: f64) -> (i64, i64) {
    (
        (pixel.x / cell_size).floor() as i64,
        (pixel.y / cell_size).floor() as i64,
    )
}

/// Group `points` into clusters at `zoom`.
///
/// Input order decides which point seeds a cluster. A non-positive radius puts
/// every point in its own cluster.
pub fn cluster_points(points: &[LngLat], zoom: f64, radius_px: f64) -> Vec<Cluster> {
    let mut seeds: Vec<Seed> = Vec::new();
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let cell_size = if radius_px > 0.0 { radius_px } else { 1.0 };

    for &point in points {
        let pixel = lnglat_to_world(point, zoom);
        let (cx, cy) = cell_of(pixel, cell_size);

        let nearest = (cx - 1..=cx + 1)
            .flat_map(|x| (cy - 1..=cy + 1).map(move |y| (x, y)))
            .filter_map(|cell| grid.get(&cell))
            .flatten()
            .copied()
            .filter(|&i| seeds[i].pixel.distance(pixel) <= radius_px)
            .min();

        match nearest {
            Some(i) if radius_px > 0.0 => {
                let seed = &mut seeds[i];
                seed.sum = Pixel::new(seed.sum.x + pixel.x, seed.sum.y + pixel.y);
                seed.members.push(point);
            }
            _ => {
                grid.entry((cx, cy)).or_default().push(seeds.len());
                seeds.push(Seed {
                    pixel,
                    sum: pixel,
                    members: vec![point],
                });
            }
        }
    }

    seeds
        .into_iter()
        .filter_map(|seed| {
            let bounds = bounding_box_of_points(seed.members.iter().copied())?;
            let n = seed.members.len() as f64;
            let mean = world_to_lnglat(Pixel::new(seed.sum.x / n, seed.sum.y / n), zoom);
            let center = LngLat::new(
                mean.lng.clamp(bounds.min_lng, bounds.max_lng),
                mean.lat.clamp(bounds.min_lat, bounds.max_lat),
            );
            Some(Cluster {
                center,
                members: seed.members,
                bounds,
            })
        })
        .collect()
}

/// Build the point layer: clustered when `clustering_available` and the point
/// count reaches `options.min_points`, plain markers otherwise.
pub fn build_point_layer(
    points: Vec<LngLat>,
    zoom: f64,
    clustering_available: bool,
    options: &ClusterOptions,
) -> PointLayer {
    if clustering_available && points.len() >= options.min_points {
        PointLayer::Clustered(cluster_points(&points, zoom, options.radius_px))
    } else {
        PointLayer::Plain(points)
    }
}
