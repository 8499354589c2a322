//! Core stop detection scan.
//!
//! A stop is detected when the movement stays within an area of bounded
//! diameter for at least a minimum duration. The scan is a single forward
//! pass with window contraction:
//!
//! 1. Anchor the window at index `i` and advance `j` while every point
//!    stays within `max_diameter` of the anchor.
//! 2. When adding `j` would break compactness (or the sequence ends), the
//!    window `[i, j-1]` is the maximal compact window for this anchor. If
//!    it spans at least `min_duration`, extend it backward over earlier
//!    points that also fit, then seal it as a stop and resume at `j`.
//! 3. Otherwise advance the anchor by one and re-scan.
//!
//! Resuming at `j` after a sealed stop means no two stops ever share a
//! record, so emitted intervals are non-overlapping and strictly ordered.
//!
//! The scan is a greedy single-pass heuristic: it reports the first-found
//! maximal compact window in scan order, not the globally longest possible
//! stop per region. This is stated behavior, trading optimality for a
//! linear pass.

use log::{debug, warn};

use crate::geo_utils::point_distance;
use crate::{Result, StopConfig, StopInterval, TrajPoint, Trajectory};

/// Detect stops in a single trajectory.
///
/// Returns the stop intervals in scan order. Every emitted interval spans
/// at least `min_duration` seconds, keeps every point within
/// `max_diameter` of the interval's first point (ties inclusive), and
/// never overlaps its neighbors. Trajectories with fewer than two records
/// cannot form a stop and yield an empty list.
///
/// The detector holds no state between calls; re-running with the same
/// input and parameters yields identical output.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use stop_detector::{detect_stops, Position, StopConfig, TrajPoint, Trajectory};
///
/// let points = (0..4)
///     .map(|i| TrajPoint::new(Utc.timestamp_opt(i * 30, 0).unwrap(), Position::new(0.0, 0.0)))
///     .collect();
/// let traj = Trajectory::new("idle", points, false).unwrap();
///
/// let stops = detect_stops(&traj, &StopConfig::default()).unwrap();
/// assert_eq!(stops.len(), 1);
/// ```
pub fn detect_stops(traj: &Trajectory, config: &StopConfig) -> Result<Vec<StopInterval>> {
    config.validate()?;

    if traj.is_latlon {
        warn!(
            "trajectory '{}' uses lat/lon coordinates; max_diameter {} is interpreted as metres under haversine distance",
            traj.id, config.max_diameter
        );
    }

    let points = &traj.points;
    let n = points.len();
    if n < 2 {
        return Ok(vec![]);
    }

    let mut stops = Vec::new();
    // First index available to the current candidate; indices below this
    // belong to an already sealed stop.
    let mut floor = 0;
    let mut i = 0;

    while i < n {
        // Maximal compact window anchored at i
        let mut j = i + 1;
        while j < n
            && point_distance(&points[i].position, &points[j].position, traj.is_latlon)
                <= config.max_diameter
        {
            j += 1;
        }
        let last = j - 1;

        if last > i && span_seconds(points, i, last) >= config.min_duration {
            // Extend backward: points before the anchor may also fit the
            // window, recovering the true start of the stop.
            let mut start = i;
            while start > floor
                && window_fits(points, start - 1, last, config, traj.is_latlon)
            {
                start -= 1;
            }
            stops.push(StopInterval {
                traj_id: traj.id.clone(),
                start_t: points[start].t,
                end_t: points[last].t,
                representative: points[last].position,
            });
            floor = j;
            i = j;
        } else {
            i += 1;
        }
    }

    debug!(
        "detected {} stops in trajectory '{}' ({} records)",
        stops.len(),
        traj.id,
        n
    );
    Ok(stops)
}

/// Window compactness re-anchored on `anchor`: every later point of
/// `[anchor, last]` within `max_diameter` of the anchor position.
fn window_fits(
    points: &[TrajPoint],
    anchor: usize,
    last: usize,
    config: &StopConfig,
    is_latlon: bool,
) -> bool {
    points[anchor + 1..=last].iter().all(|p| {
        point_distance(&points[anchor].position, &p.position, is_latlon) <= config.max_diameter
    })
}

fn span_seconds(points: &[TrajPoint], from: usize, to: usize) -> f64 {
    (points[to].t - points[from].t).num_milliseconds() as f64 / 1000.0
}
