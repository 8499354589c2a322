//! Collection-level stop detection.
//!
//! Applies the single-trajectory detector to every trajectory in a
//! collection. Trajectories are processed in isolation; there is no
//! cross-trajectory interaction, which makes the parallel variant an
//! embarrassingly parallel fan-out over the trajectory list.

use std::collections::HashMap;

use log::info;

use crate::detector::detect_stops;
use crate::views::{stop_segments, SegmentIdGenerator, StopSegment};
use crate::{Result, StopConfig, StopInterval, Trajectory};

/// An ordered set of trajectories.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryCollection {
    pub trajectories: Vec<Trajectory>,
}

impl TrajectoryCollection {
    pub fn new(trajectories: Vec<Trajectory>) -> Self {
        Self { trajectories }
    }

    /// Keep only trajectories with a path length of at least `min_length`
    /// (CRS units, metres when geographic).
    pub fn with_min_length(trajectories: Vec<Trajectory>, min_length: f64) -> Self {
        Self {
            trajectories: trajectories
                .into_iter()
                .filter(|t| t.length() >= min_length)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Look up a trajectory by identity.
    pub fn get(&self, traj_id: &str) -> Option<&Trajectory> {
        self.trajectories.iter().find(|t| t.id == traj_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trajectory> {
        self.trajectories.iter()
    }
}

/// Detected stops for a collection, keyed by trajectory identity.
///
/// Preserves the collection's trajectory order; within one trajectory the
/// intervals keep scan order.
#[derive(Debug, Clone, Default)]
pub struct StopCollection {
    by_trajectory: HashMap<String, Vec<StopInterval>>,
    order: Vec<String>,
}

impl StopCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the stops detected for one trajectory.
    pub fn insert(&mut self, traj_id: &str, stops: Vec<StopInterval>) {
        if !self.by_trajectory.contains_key(traj_id) {
            self.order.push(traj_id.to_string());
        }
        self.by_trajectory
            .entry(traj_id.to_string())
            .or_default()
            .extend(stops);
    }

    /// Stops for one trajectory identity; empty for unknown identities.
    pub fn get(&self, traj_id: &str) -> &[StopInterval] {
        self.by_trajectory
            .get(traj_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Trajectory identities in insertion order.
    pub fn trajectory_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// All intervals, flattened in trajectory order.
    pub fn all(&self) -> Vec<&StopInterval> {
        self.order
            .iter()
            .flat_map(|id| self.by_trajectory[id].iter())
            .collect()
    }

    /// Number of detected stops across the whole collection.
    pub fn stop_count(&self) -> usize {
        self.by_trajectory.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stop_count() == 0
    }
}

/// Detect stops for every trajectory in the collection, sequentially.
///
/// Order preserving and fail-fast: the first trajectory error aborts the
/// whole call.
pub fn detect_stops_collection(
    collection: &TrajectoryCollection,
    config: &StopConfig,
) -> Result<StopCollection> {
    config.validate()?;

    let mut result = StopCollection::new();
    for traj in collection.iter() {
        let stops = detect_stops(traj, config)?;
        result.insert(&traj.id, stops);
    }

    info!(
        "detected {} stops across {} trajectories",
        result.stop_count(),
        collection.len()
    );
    Ok(result)
}

/// Detect stops for every trajectory in the collection, in parallel.
///
/// Each worker owns a disjoint slice of the trajectory list and the two
/// scalar parameters; results are gathered after all workers complete.
/// Fail-fast like the sequential driver: one worker's error aborts the
/// call and no partial collection is returned.
#[cfg(feature = "parallel")]
pub fn detect_stops_collection_parallel(
    collection: &TrajectoryCollection,
    config: &StopConfig,
) -> Result<StopCollection> {
    use rayon::prelude::*;

    config.validate()?;

    let detected: Result<Vec<(String, Vec<StopInterval>)>> = collection
        .trajectories
        .par_iter()
        .map(|traj| detect_stops(traj, config).map(|stops| (traj.id.clone(), stops)))
        .collect();

    let mut result = StopCollection::new();
    for (traj_id, stops) in detected? {
        result.insert(&traj_id, stops);
    }

    info!(
        "detected {} stops across {} trajectories (parallel)",
        result.stop_count(),
        collection.len()
    );
    Ok(result)
}

/// Stop segments for a whole collection, numbered by one shared id
/// generator so every segment identity is unique across trajectories.
pub fn collection_stop_segments(
    collection: &TrajectoryCollection,
    stops: &StopCollection,
    ids: &mut SegmentIdGenerator,
) -> Result<Vec<StopSegment>> {
    let mut segments = Vec::new();
    for traj in collection.iter() {
        segments.extend(stop_segments(traj, stops.get(&traj.id), ids)?);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{make_traj, ts};
    use crate::StopDetectionError;

    fn sample_collection() -> TrajectoryCollection {
        // "a" dwells at the origin for two minutes then leaves;
        // "b" never dwells; "c" dwells twice.
        let a = make_traj(
            "a",
            &[
                (0.0, 0.0, 0),
                (1.0, 0.0, 60),
                (2.0, 0.0, 120),
                (900.0, 0.0, 180),
            ],
        );
        let b = make_traj("b", &[(0.0, 0.0, 0), (500.0, 0.0, 60), (1000.0, 0.0, 120)]);
        let c = make_traj(
            "c",
            &[
                (0.0, 0.0, 0),
                (1.0, 0.0, 90),
                (700.0, 0.0, 120),
                (701.0, 0.0, 210),
                (1500.0, 0.0, 240),
            ],
        );
        TrajectoryCollection::new(vec![a, b, c])
    }

    fn cfg() -> StopConfig {
        StopConfig {
            max_diameter: 10.0,
            min_duration: 60.0,
        }
    }

    #[test]
    fn test_collection_detection() {
        let collection = sample_collection();
        let stops = detect_stops_collection(&collection, &cfg()).unwrap();

        assert_eq!(stops.get("a").len(), 1);
        assert_eq!(stops.get("b").len(), 0);
        assert_eq!(stops.get("c").len(), 2);
        assert_eq!(stops.stop_count(), 3);

        // Per-trajectory identity survives flattening, collection order kept
        let ids: Vec<&str> = stops.trajectory_ids().collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        let all = stops.all();
        assert_eq!(all[0].traj_id, "a");
        assert_eq!(all[1].traj_id, "c");
        assert_eq!(all[1].start_t, ts(0));
        assert_eq!(all[2].start_t, ts(120));
    }

    #[test]
    fn test_unknown_identity_is_empty() {
        let collection = sample_collection();
        let stops = detect_stops_collection(&collection, &cfg()).unwrap();
        assert!(stops.get("nope").is_empty());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let collection = sample_collection();
        let bad = StopConfig {
            max_diameter: 10.0,
            min_duration: 0.0,
        };
        assert!(matches!(
            detect_stops_collection(&collection, &bad),
            Err(StopDetectionError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_min_length_filter() {
        let long = make_traj("long", &[(0.0, 0.0, 0), (5000.0, 0.0, 60)]);
        let short = make_traj("short", &[(0.0, 0.0, 0), (10.0, 0.0, 60)]);
        let collection = TrajectoryCollection::with_min_length(vec![long, short], 100.0);
        assert_eq!(collection.len(), 1);
        assert!(collection.get("long").is_some());
        assert!(collection.get("short").is_none());
    }

    #[test]
    fn test_collection_segments_share_id_counter() {
        let collection = sample_collection();
        let stops = detect_stops_collection(&collection, &cfg()).unwrap();
        let mut ids = SegmentIdGenerator::new();
        let segments = collection_stop_segments(&collection, &stops, &mut ids).unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].id, "a_0");
        assert_eq!(segments[0].parent_id, "a");
        assert_eq!(segments[1].id, "c_1");
        assert_eq!(segments[2].id, "c_2");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let collection = sample_collection();
        let sequential = detect_stops_collection(&collection, &cfg()).unwrap();
        let parallel = detect_stops_collection_parallel(&collection, &cfg()).unwrap();

        let seq_ids: Vec<&str> = sequential.trajectory_ids().collect();
        let par_ids: Vec<&str> = parallel.trajectory_ids().collect();
        assert_eq!(seq_ids, par_ids);
        for id in seq_ids {
            assert_eq!(sequential.get(id), parallel.get(id));
        }
    }
}
