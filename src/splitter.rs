//! Splitting trajectories at detected stops.
//!
//! The dual of the stop-segments view: detection finds the stop intervals,
//! the splitter emits everything else. Emitted sub-trajectories contain the
//! maximal runs of records strictly outside every stop interval, so stop
//! segments and split segments partition the original record sequence with
//! no record in both.

use log::debug;

use crate::detector::detect_stops;
use crate::views::SegmentIdGenerator;
use crate::{Result, StopConfig, StopInterval, TrajPoint, Trajectory, TrajectoryCollection};

/// Split one trajectory at its detected stops.
///
/// Runs the detector, then emits the complement sub-trajectories in time
/// order under synthetic `"{id}_{n}"` identities. Runs of fewer than two
/// records cannot represent movement and are dropped. A trajectory without
/// stops comes back as a single sub-trajectory holding every record.
pub fn split_at_stops(traj: &Trajectory, config: &StopConfig) -> Result<Vec<Trajectory>> {
    let stops = detect_stops(traj, config)?;
    let mut ids = SegmentIdGenerator::new();
    let segments = complement_segments(traj, &stops, &mut ids);
    debug!(
        "split trajectory '{}' into {} movement segments around {} stops",
        traj.id,
        segments.len(),
        stops.len()
    );
    Ok(segments)
}

/// Split every trajectory in a collection at its detected stops.
///
/// Sub-trajectories shorter than `min_length` (CRS units, metres when
/// geographic) are discarded. One id counter is shared across the whole
/// collection. Fail-fast on the first trajectory error.
pub fn split_collection(
    collection: &TrajectoryCollection,
    config: &StopConfig,
    min_length: f64,
) -> Result<TrajectoryCollection> {
    let mut ids = SegmentIdGenerator::new();
    let mut segments = Vec::new();
    for traj in collection.iter() {
        let stops = detect_stops(traj, config)?;
        segments.extend(
            complement_segments(traj, &stops, &mut ids)
                .into_iter()
                .filter(|segment| segment.length() >= min_length),
        );
    }
    Ok(TrajectoryCollection::new(segments))
}

/// Maximal runs of records strictly outside every stop interval.
fn complement_segments(
    traj: &Trajectory,
    stops: &[StopInterval],
    ids: &mut SegmentIdGenerator,
) -> Vec<Trajectory> {
    let mut segments = Vec::new();
    let mut run: Vec<TrajPoint> = Vec::new();

    for point in &traj.points {
        let stopped = stops
            .iter()
            .any(|s| point.t >= s.start_t && point.t <= s.end_t);
        if stopped {
            flush_run(traj, &mut run, ids, &mut segments);
        } else {
            run.push(point.clone());
        }
    }
    flush_run(traj, &mut run, ids, &mut segments);

    segments
}

fn flush_run(
    traj: &Trajectory,
    run: &mut Vec<TrajPoint>,
    ids: &mut SegmentIdGenerator,
    segments: &mut Vec<Trajectory>,
) {
    // A single leftover record cannot represent movement
    if run.len() >= 2 {
        // Records come straight out of a validated trajectory, in order
        segments.push(Trajectory {
            id: ids.next_id(&traj.id),
            points: std::mem::take(run),
            is_latlon: traj.is_latlon,
        });
    } else {
        run.clear();
    }
}
