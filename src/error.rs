//! Unified error handling for the stop-detector library.
//!
//! Structural input problems and invalid parameters are surfaced through a
//! single error type; the algorithms never attempt repair or retries.

use std::fmt;

/// Unified error type for stop-detector operations.
#[derive(Debug, Clone)]
pub enum StopDetectionError {
    /// Trajectory has no records
    EmptyTrajectory { traj_id: String },
    /// Record timestamps are not strictly increasing
    NonMonotonicTimestamps { traj_id: String, index: usize },
    /// Detection parameter is unusable
    InvalidParameter { message: String },
    /// Requested time lies outside the trajectory's time range
    TimeOutOfRange { traj_id: String, message: String },
}

impl fmt::Display for StopDetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopDetectionError::EmptyTrajectory { traj_id } => {
                write!(f, "Trajectory '{}' has no records", traj_id)
            }
            StopDetectionError::NonMonotonicTimestamps { traj_id, index } => {
                write!(
                    f,
                    "Trajectory '{}' has a non-increasing timestamp at record {}",
                    traj_id, index
                )
            }
            StopDetectionError::InvalidParameter { message } => {
                write!(f, "Invalid parameter: {}", message)
            }
            StopDetectionError::TimeOutOfRange { traj_id, message } => {
                write!(
                    f,
                    "Time out of range for trajectory '{}': {}",
                    traj_id, message
                )
            }
        }
    }
}

impl std::error::Error for StopDetectionError {}

/// Result type alias for stop-detector operations.
pub type Result<T> = std::result::Result<T, StopDetectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StopDetectionError::NonMonotonicTimestamps {
            traj_id: "walk-1".to_string(),
            index: 7,
        };
        assert!(err.to_string().contains("walk-1"));
        assert!(err.to_string().contains("record 7"));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = StopDetectionError::InvalidParameter {
            message: "min_duration must be > 0, got 0".to_string(),
        };
        assert!(err.to_string().contains("min_duration"));
    }
}
