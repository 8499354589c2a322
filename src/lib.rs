//! # Stop Detector
//!
//! Stop detection, splitting and evaluation for movement trajectories.
//!
//! A stop is a time interval during which a moving entity stayed within a
//! bounded spatial neighborhood (`max_diameter`) for at least a minimum
//! duration (`min_duration`). This library provides:
//! - Stop detection over a single trajectory or a whole collection
//! - Three output views: time ranges, stop points, stop segments
//! - Trajectory splitting at detected stops (the complement operation)
//! - Evaluation of detected stops against a ground truth
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel collection processing with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use stop_detector::{detect_stops, Position, StopConfig, TrajPoint, Trajectory};
//!
//! // Five points idling at the origin, one minute apart, then a jump away
//! let mut points: Vec<TrajPoint> = (0..5)
//!     .map(|i| TrajPoint::new(Utc.timestamp_opt(i * 60, 0).unwrap(), Position::new(0.0, 0.0)))
//!     .collect();
//! points.push(TrajPoint::new(
//!     Utc.timestamp_opt(300, 0).unwrap(),
//!     Position::new(5000.0, 0.0),
//! ));
//!
//! let traj = Trajectory::new("walk-1", points, false).unwrap();
//! let config = StopConfig {
//!     max_diameter: 100.0,
//!     min_duration: 120.0,
//! };
//!
//! let stops = detect_stops(&traj, &config).unwrap();
//! assert_eq!(stops.len(), 1);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, StopDetectionError};

// Geographic utilities (distance, interpolation, path length)
pub mod geo_utils;

// Core stop detection scan
pub mod detector;
pub use detector::detect_stops;

// Output views over detected stop intervals
pub mod views;
pub use views::{
    stop_points, stop_segments, stop_time_ranges, SegmentIdGenerator, StopLocation, StopPoint,
    StopSegment,
};

// Collection-level driver
pub mod collection;
#[cfg(feature = "parallel")]
pub use collection::detect_stops_collection_parallel;
pub use collection::{
    collection_stop_segments, detect_stops_collection, StopCollection, TrajectoryCollection,
};

// Splitting trajectories at detected stops
pub mod splitter;
pub use splitter::{split_at_stops, split_collection};

// Evaluation of detected stops against a ground truth
pub mod evaluation;
pub use evaluation::{compare_stops, ComparisonCounts, ComparisonResult};

// ============================================================================
// Core Types
// ============================================================================

/// A 2D coordinate.
///
/// `x` is longitude (or easting), `y` is latitude (or northing). Whether the
/// pair is interpreted as geographic or projected is decided by the owning
/// [`Trajectory`]'s `is_latlon` flag.
///
/// # Example
/// ```
/// use stop_detector::Position;
/// let p = Position::new(-0.1278, 51.5074); // London (lon, lat)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check that the coordinates are usable.
    ///
    /// Finite values are always required; the lat/lon range check only
    /// applies to geographic coordinates.
    pub fn is_valid(&self, is_latlon: bool) -> bool {
        if !self.x.is_finite() || !self.y.is_finite() {
            return false;
        }
        if is_latlon {
            self.y >= -90.0 && self.y <= 90.0 && self.x >= -180.0 && self.x <= 180.0
        } else {
            true
        }
    }
}

/// One timestamped trajectory record with an open attribute bag.
///
/// The attribute bag carries whatever per-point columns the source data has
/// (speed, heading, sensor readings). Stop detection never reads it; it is
/// preserved verbatim through slicing and splitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajPoint {
    /// Record timestamp
    pub t: DateTime<Utc>,
    /// Record position
    pub position: Position,
    /// Open per-point attributes
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, serde_json::Value>,
}

impl TrajPoint {
    /// Create a record with an empty attribute bag.
    pub fn new(t: DateTime<Utc>, position: Position) -> Self {
        Self {
            t,
            position,
            attrs: HashMap::new(),
        }
    }

    /// Create a record carrying attributes.
    pub fn with_attrs(
        t: DateTime<Utc>,
        position: Position,
        attrs: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self { t, position, attrs }
    }
}

/// An ordered sequence of timestamped positions for one moving entity.
///
/// Timestamps are strictly increasing; this is validated at construction
/// and never repaired. The trajectory is read-only for every operation in
/// this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Identifier of the moving entity / track
    pub id: String,
    /// Ordered records
    pub points: Vec<TrajPoint>,
    /// True for geographic (lat/lon) coordinates, false for projected
    pub is_latlon: bool,
}

impl Trajectory {
    /// Create a trajectory, validating the structural invariants.
    ///
    /// Fails with [`StopDetectionError::EmptyTrajectory`] for an empty
    /// point list and [`StopDetectionError::NonMonotonicTimestamps`] when
    /// any record does not strictly follow its predecessor in time.
    pub fn new(id: &str, points: Vec<TrajPoint>, is_latlon: bool) -> Result<Self> {
        if points.is_empty() {
            return Err(StopDetectionError::EmptyTrajectory {
                traj_id: id.to_string(),
            });
        }
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].t <= pair[0].t {
                return Err(StopDetectionError::NonMonotonicTimestamps {
                    traj_id: id.to_string(),
                    index: index + 1,
                });
            }
        }
        Ok(Self {
            id: id.to_string(),
            points,
            is_latlon,
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the trajectory holds no records (never, by construction).
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Timestamp of the first record.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.points[0].t
    }

    /// Timestamp of the last record.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.points[self.points.len() - 1].t
    }

    /// Total duration from first to last record.
    pub fn duration(&self) -> Duration {
        self.end_time() - self.start_time()
    }

    /// Total path length in CRS units (metres when geographic).
    pub fn length(&self) -> f64 {
        geo_utils::path_length(&self.points, self.is_latlon)
    }

    /// Interpolated position at time `t`.
    ///
    /// Record timestamps return the record position exactly; times between
    /// two records interpolate linearly along the bracketing segment.
    /// Times outside the trajectory's time range are an error.
    pub fn position_at(&self, t: DateTime<Utc>) -> Result<Position> {
        if t < self.start_time() || t > self.end_time() {
            return Err(StopDetectionError::TimeOutOfRange {
                traj_id: self.id.clone(),
                message: format!("{} outside [{}, {}]", t, self.start_time(), self.end_time()),
            });
        }

        // First record at or after t
        let idx = self.points.partition_point(|p| p.t < t);
        let next = &self.points[idx];
        if next.t == t {
            return Ok(next.position);
        }

        let prev = &self.points[idx - 1];
        let span = (next.t - prev.t).num_milliseconds() as f64;
        let offset = (t - prev.t).num_milliseconds() as f64;
        Ok(geo_utils::interpolate_position(
            &prev.position,
            &next.position,
            offset / span,
        ))
    }

    /// Extract the closed sub-sequence of records with `t0 <= t <= tn`.
    ///
    /// The result keeps this trajectory's id and CRS flag; callers that
    /// need a distinct identity rename it afterwards. Fails when the range
    /// is inverted or contains no records.
    pub fn segment_between(&self, t0: DateTime<Utc>, tn: DateTime<Utc>) -> Result<Trajectory> {
        if tn < t0 {
            return Err(StopDetectionError::InvalidParameter {
                message: format!("inverted time range [{}, {}]", t0, tn),
            });
        }
        let points: Vec<TrajPoint> = self
            .points
            .iter()
            .filter(|p| p.t >= t0 && p.t <= tn)
            .cloned()
            .collect();
        if points.is_empty() {
            return Err(StopDetectionError::TimeOutOfRange {
                traj_id: self.id.clone(),
                message: format!("no records in [{}, {}]", t0, tn),
            });
        }
        Trajectory::new(&self.id, points, self.is_latlon)
    }
}

/// A detected stop: the entity stayed within `max_diameter` from `start_t`
/// to `end_t`.
///
/// Immutable once emitted. `representative` is the last point of the
/// sealed detection window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopInterval {
    /// Identity of the trajectory the stop was found in
    pub traj_id: String,
    /// First timestamp of the stop
    pub start_t: DateTime<Utc>,
    /// Last timestamp of the stop
    pub end_t: DateTime<Utc>,
    /// Last point of the sealed detection window
    pub representative: Position,
}

impl StopInterval {
    /// Stop duration in seconds.
    pub fn duration_s(&self) -> f64 {
        (self.end_t - self.start_t).num_milliseconds() as f64 / 1000.0
    }
}

/// Configuration for stop detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConfig {
    /// Maximum stop diameter in CRS units (metres when geographic).
    /// A candidate window is compact while every point stays within this
    /// distance of the window anchor. Default: 100.0
    pub max_diameter: f64,

    /// Minimum stop duration in seconds. Default: 60.0
    pub min_duration: f64,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            max_diameter: 100.0,
            min_duration: 60.0,
        }
    }
}

impl StopConfig {
    /// Reject unusable parameters before any scanning starts.
    ///
    /// `max_diameter` may be zero (detects perfect idling at an exactly
    /// repeated position); `min_duration` must be strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !self.max_diameter.is_finite() || self.max_diameter < 0.0 {
            return Err(StopDetectionError::InvalidParameter {
                message: format!("max_diameter must be >= 0, got {}", self.max_diameter),
            });
        }
        if !self.min_duration.is_finite() || self.min_duration <= 0.0 {
            return Err(StopDetectionError::InvalidParameter {
                message: format!("min_duration must be > 0, got {}", self.min_duration),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// Build a projected-CRS trajectory from (x, y, seconds) tuples.
    pub fn make_traj(id: &str, nodes: &[(f64, f64, i64)]) -> Trajectory {
        let points = nodes
            .iter()
            .map(|&(x, y, s)| TrajPoint::new(Utc.timestamp_opt(s, 0).unwrap(), Position::new(x, y)))
            .collect();
        Trajectory::new(id, points, false).unwrap()
    }

    pub fn ts(s: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(s, 0).unwrap()
    }
}
