//! Geographic utilities: point distance, interpolation and path length.
//!
//! All distance computation goes through [`point_distance`], which picks
//! haversine (geodesic metres) for geographic coordinates and plain
//! euclidean distance (CRS units) for projected ones. Both are symmetric
//! and respect the triangle inequality, so the detector's compactness test
//! behaves as a true neighborhood check under either metric.

use geo::{Distance, Euclidean, Haversine, Point};

use crate::{Position, TrajPoint};

/// Distance between two positions.
///
/// Haversine great-circle distance in metres when `is_latlon`, euclidean
/// distance in CRS units otherwise.
///
/// # Example
/// ```
/// use stop_detector::Position;
/// use stop_detector::geo_utils::point_distance;
///
/// let london = Position::new(-0.1278, 51.5074);
/// let paris = Position::new(2.3522, 48.8566);
/// let dist = point_distance(&london, &paris, true);
/// assert!((dist - 344_000.0).abs() < 5_000.0);
/// ```
pub fn point_distance(a: &Position, b: &Position, is_latlon: bool) -> f64 {
    let p1 = Point::new(a.x, a.y);
    let p2 = Point::new(b.x, b.y);
    if is_latlon {
        Haversine::distance(p1, p2)
    } else {
        Euclidean::distance(p1, p2)
    }
}

/// Position at `ratio` (0.0..=1.0) along the straight segment from `a` to `b`.
///
/// Linear interpolation in coordinate space, matching how positions between
/// records are resolved along a trajectory segment.
pub fn interpolate_position(a: &Position, b: &Position, ratio: f64) -> Position {
    Position::new(a.x + ratio * (b.x - a.x), a.y + ratio * (b.y - a.y))
}

/// Total length of the path through `points`, in CRS units.
pub fn path_length(points: &[TrajPoint], is_latlon: bool) -> f64 {
    points
        .windows(2)
        .map(|w| point_distance(&w[0].position, &w[1].position, is_latlon))
        .sum()
}
