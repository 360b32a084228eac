//! Unified error hierarchy for PaceGrid
//!
//! Every fallible operation in the crate returns [`Result`]. The core pipeline
//! errors are local and non-recoverable: the caller decides whether to skip a
//! malformed recording or surface the failure.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all PaceGrid operations
#[derive(Debug, Error)]
pub enum PaceGridError {
    /// Track preparation was asked to process an empty point sequence
    #[error("track contains no points")]
    EmptyTrack,

    /// Timestamps in a track are not monotonically non-decreasing
    #[error("timestamps regress at sample {index}: {previous} > {current}")]
    ClockOrder {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    /// Surfaces with different shapes cannot be aggregated
    #[error("surface shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Aggregation over zero surfaces
    #[error("no surfaces to aggregate")]
    EmptyInput,

    /// A date string did not match the YYYY-MM-DD selection format
    #[error("invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// A stored surface grid has inconsistent dimensions or labels
    #[error("malformed surface: {0}")]
    MalformedSurface(String),

    /// No surface stored for the given recording
    #[error("no stored surface for recording {recording_id:?}")]
    SurfaceNotFound { recording_id: String },

    /// Track file parsing errors
    #[error("parse error in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON read/write errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for PaceGrid operations
pub type Result<T> = std::result::Result<T, PaceGridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PaceGridError::InvalidDate {
            value: "not-a-date".to_string(),
        };
        assert!(err.to_string().contains("not-a-date"));

        let err = PaceGridError::ShapeMismatch {
            expected: (7201, 61),
            actual: (61, 61),
        };
        assert!(err.to_string().contains("7201"));
    }
}
