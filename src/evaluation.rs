//! Evaluation of detected stops against a ground truth.
//!
//! Classifies intervals per trajectory identity with an open-interval
//! overlap test (`start1 < end2 && start2 < end1`):
//! - a ground-truth interval overlapping at least one predicted interval
//!   is a true positive
//! - a ground-truth interval with no overlapping prediction is a false
//!   negative
//! - a predicted interval with no overlapping ground truth is a false
//!   positive
//!
//! The scan is pairwise per identity with early exit on the first overlap.
//! No one-to-one assignment is performed: a single predicted interval that
//! overlaps several ground-truth intervals counts as a true positive for
//! each of them. This is the intended evaluation policy, not an oversight.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{StopCollection, StopInterval};

/// Classified intervals from one comparison run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Ground-truth intervals matched by at least one prediction
    pub true_positives: Vec<StopInterval>,
    /// Ground-truth intervals no prediction overlaps
    pub false_negatives: Vec<StopInterval>,
    /// Predicted intervals no ground truth overlaps
    pub false_positives: Vec<StopInterval>,
}

/// Plain counts of a [`ComparisonResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonCounts {
    pub true_positives: usize,
    pub false_negatives: usize,
    pub false_positives: usize,
}

impl ComparisonResult {
    pub fn counts(&self) -> ComparisonCounts {
        ComparisonCounts {
            true_positives: self.true_positives.len(),
            false_negatives: self.false_negatives.len(),
            false_positives: self.false_positives.len(),
        }
    }

    /// TP / (TP + FP); 0.0 when nothing was predicted.
    pub fn precision(&self) -> f64 {
        let tp = self.true_positives.len() as f64;
        let fp = self.false_positives.len() as f64;
        if tp + fp == 0.0 {
            0.0
        } else {
            tp / (tp + fp)
        }
    }

    /// TP / (TP + FN); 0.0 when there is no ground truth.
    pub fn recall(&self) -> f64 {
        let tp = self.true_positives.len() as f64;
        let fn_ = self.false_negatives.len() as f64;
        if tp + fn_ == 0.0 {
            0.0
        } else {
            tp / (tp + fn_)
        }
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

/// Open-interval temporal overlap.
fn overlaps(a: &StopInterval, b: &StopInterval) -> bool {
    a.start_t < b.end_t && b.start_t < a.end_t
}

/// Compare predicted stop intervals against a ground truth.
///
/// Identities present on only one side still count: every ground-truth
/// interval of an unpredicted identity is a false negative, and every
/// predicted interval of an unknown identity is a false positive.
pub fn compare_stops(
    ground_truth: &StopCollection,
    predicted: &StopCollection,
) -> ComparisonResult {
    let mut result = ComparisonResult::default();

    let identities: Vec<&str> = {
        let mut seen = HashSet::new();
        ground_truth
            .trajectory_ids()
            .chain(predicted.trajectory_ids())
            .filter(|id| seen.insert(*id))
            .collect()
    };

    for traj_id in identities {
        let truth = ground_truth.get(traj_id);
        let guesses = predicted.get(traj_id);

        for interval in truth {
            if guesses.iter().any(|g| overlaps(interval, g)) {
                result.true_positives.push(interval.clone());
            } else {
                result.false_negatives.push(interval.clone());
            }
        }
        for guess in guesses {
            if !truth.iter().any(|t| overlaps(t, guess)) {
                result.false_positives.push(guess.clone());
            }
        }
    }

    result
}
