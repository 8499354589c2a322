//! Output views over detected stop intervals.
//!
//! Three read-only shapes consumers need:
//! - time ranges (pass-through `(start, end)` pairs)
//! - stop points (one located record per stop, with duration)
//! - stop segments (the sub-trajectory spanning each stop)
//!
//! All views are pure functions of `(Trajectory, &[StopInterval])`; the
//! same detector output can be formatted repeatedly, with different
//! parameters, without any shared state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Position, Result, StopInterval, Trajectory};

/// Pass-through view: `(start, end)` per detected stop, in scan order.
pub fn stop_time_ranges(stops: &[StopInterval]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    stops.iter().map(|s| (s.start_t, s.end_t)).collect()
}

/// Which position represents a stop in the [`stop_points`] view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopLocation {
    /// Interpolated position at the stop's start time
    Start,
    /// Interpolated position at the stop's end time
    End,
    /// Interpolated position at the temporal midpoint of the stop
    Midpoint,
    /// The last point of the sealed detection window
    #[default]
    Representative,
}

/// One located record per detected stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopPoint {
    /// Synthetic stop identity (`"{traj_id}_{n}"`)
    pub stop_id: String,
    /// Identity of the originating trajectory
    pub traj_id: String,
    /// Stop location per the requested [`StopLocation`]
    pub position: Position,
    /// First timestamp of the stop
    pub start_t: DateTime<Utc>,
    /// Last timestamp of the stop
    pub end_t: DateTime<Utc>,
    /// Stop duration in seconds
    pub duration_s: f64,
}

/// A sub-trajectory spanning one detected stop.
///
/// `parent_id` is a plain identifier back-reference to the originating
/// trajectory, never an owning handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSegment {
    /// Synthetic segment identity (`"{parent_id}_{n}"`)
    pub id: String,
    /// Identity of the originating trajectory
    pub parent_id: String,
    /// Records within the stop's closed time range
    pub trajectory: Trajectory,
}

/// Running counter for synthetic `"{parent}_{n}"` identities.
///
/// Explicit state threaded through formatter and driver calls; a fresh
/// generator starts numbering at 0, and sharing one generator across a
/// collection keeps every emitted identity unique.
#[derive(Debug, Clone, Default)]
pub struct SegmentIdGenerator {
    next: u64,
}

impl SegmentIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next `"{parent}_{n}"` identity.
    pub fn next_id(&mut self, parent: &str) -> String {
        let id = format!("{}_{}", parent, self.next);
        self.next += 1;
        id
    }
}

/// Stop points view: one [`StopPoint`] per interval.
///
/// Positions are resolved against the source trajectory except for
/// [`StopLocation::Representative`], which reuses the point sealed with
/// the interval.
pub fn stop_points(
    traj: &Trajectory,
    stops: &[StopInterval],
    location: StopLocation,
    ids: &mut SegmentIdGenerator,
) -> Result<Vec<StopPoint>> {
    stops
        .iter()
        .map(|stop| {
            let position = match location {
                StopLocation::Start => traj.position_at(stop.start_t)?,
                StopLocation::End => traj.position_at(stop.end_t)?,
                StopLocation::Midpoint => {
                    let half = Duration::milliseconds(
                        (stop.end_t - stop.start_t).num_milliseconds() / 2,
                    );
                    traj.position_at(stop.start_t + half)?
                }
                StopLocation::Representative => stop.representative,
            };
            Ok(StopPoint {
                stop_id: ids.next_id(&stop.traj_id),
                traj_id: stop.traj_id.clone(),
                position,
                start_t: stop.start_t,
                end_t: stop.end_t,
                duration_s: stop.duration_s(),
            })
        })
        .collect()
}

/// Stop segments view: the closed `[start, end]` sub-trajectory per
/// interval, under a synthetic identity with a parent back-reference.
pub fn stop_segments(
    traj: &Trajectory,
    stops: &[StopInterval],
    ids: &mut SegmentIdGenerator,
) -> Result<Vec<StopSegment>> {
    stops
        .iter()
        .map(|stop| {
            let mut segment = traj.segment_between(stop.start_t, stop.end_t)?;
            let id = ids.next_id(&traj.id);
            segment.id = id.clone();
            Ok(StopSegment {
                id,
                parent_id: traj.id.clone(),
                trajectory: segment,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::detect_stops;
    use crate::test_support::{make_traj, ts};
    use crate::StopConfig;

    fn stopping_traj() -> Trajectory {
        make_traj(
            "a",
            &[
                (0.0, 0.0, 0),
                (0.0, 10.0, 1),
                (0.0, 20.0, 2),
                (0.0, 21.0, 4),
                (0.0, 22.0, 6),
                (0.0, 30.0, 8),
                (0.0, 40.0, 10),
                (1.0, 50.0, 15),
            ],
        )
    }

    fn cfg() -> StopConfig {
        StopConfig {
            max_diameter: 3.0,
            min_duration: 2.0,
        }
    }

    #[test]
    fn test_time_ranges_passthrough() {
        let traj = stopping_traj();
        let stops = detect_stops(&traj, &cfg()).unwrap();
        let ranges = stop_time_ranges(&stops);
        assert_eq!(ranges, vec![(ts(2), ts(6))]);
    }

    #[test]
    fn test_stop_points() {
        let traj = stopping_traj();
        let stops = detect_stops(&traj, &cfg()).unwrap();
        let mut ids = SegmentIdGenerator::new();
        let points = stop_points(&traj, &stops, StopLocation::default(), &mut ids).unwrap();

        assert_eq!(points.len(), 1);
        let point = &points[0];
        assert_eq!(point.stop_id, "a_0");
        assert_eq!(point.traj_id, "a");
        assert_eq!(point.start_t, ts(2));
        assert_eq!(point.end_t, ts(6));
        assert_eq!(point.duration_s, 4.0);
        // Representative = last point of the sealed window
        assert_eq!(point.position, Position::new(0.0, 22.0));
    }

    #[test]
    fn test_stop_point_locations() {
        let traj = stopping_traj();
        let stops = detect_stops(&traj, &cfg()).unwrap();

        let mut ids = SegmentIdGenerator::new();
        let start = stop_points(&traj, &stops, StopLocation::Start, &mut ids).unwrap();
        assert_eq!(start[0].position, Position::new(0.0, 20.0));

        let mut ids = SegmentIdGenerator::new();
        let end = stop_points(&traj, &stops, StopLocation::End, &mut ids).unwrap();
        assert_eq!(end[0].position, Position::new(0.0, 22.0));

        let mut ids = SegmentIdGenerator::new();
        let mid = stop_points(&traj, &stops, StopLocation::Midpoint, &mut ids).unwrap();
        // Midpoint t=4 falls on the record at (0, 21)
        assert_eq!(mid[0].position, Position::new(0.0, 21.0));
    }

    #[test]
    fn test_stop_segments() {
        let traj = stopping_traj();
        let stops = detect_stops(&traj, &cfg()).unwrap();
        let mut ids = SegmentIdGenerator::new();
        let segments = stop_segments(&traj, &stops, &mut ids).unwrap();

        assert_eq!(segments.len(), 1);
        let segment = &segments[0];
        assert_eq!(segment.id, "a_0");
        assert_eq!(segment.parent_id, "a");
        assert_eq!(segment.trajectory.id, "a_0");
        assert_eq!(segment.trajectory.len(), 3);
        assert_eq!(segment.trajectory.start_time(), ts(2));
        assert_eq!(segment.trajectory.end_time(), ts(6));
    }

    #[test]
    fn test_id_generator_threads_across_calls() {
        let traj = stopping_traj();
        let stops = detect_stops(&traj, &cfg()).unwrap();
        let mut ids = SegmentIdGenerator::new();
        let first = stop_segments(&traj, &stops, &mut ids).unwrap();
        let second = stop_segments(&traj, &stops, &mut ids).unwrap();
        assert_eq!(first[0].id, "a_0");
        assert_eq!(second[0].id, "a_1");
    }

    #[test]
    fn test_views_of_empty_stop_list() {
        let traj = stopping_traj();
        let mut ids = SegmentIdGenerator::new();
        assert!(stop_time_ranges(&[]).is_empty());
        assert!(stop_points(&traj, &[], StopLocation::default(), &mut ids)
            .unwrap()
            .is_empty());
        assert!(stop_segments(&traj, &[], &mut ids).unwrap().is_empty());
    }
}
