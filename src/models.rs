//! Core data structures shared across the PaceGrid pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SurfaceConfig;
use crate::error::{PaceGridError, Result};

/// One raw GPS sample from a recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    /// Absolute instant the sample was recorded
    pub time: DateTime<Utc>,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Elevation in meters
    pub elevation: f64,
}

/// Per-sample kinematics derived from consecutive raw points
///
/// The first sample of a track carries all-zero deltas. Ratios with a zero
/// denominator are defined as 0 rather than an error, keeping the pipeline
/// total over degenerate tracks (duplicate timestamps, stationary points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreparedSample {
    /// Seconds since the first sample of the track
    pub elapsed_secs: f64,
    /// Great-circle distance from the previous sample, meters
    pub dist_delta_m: f64,
    /// Elevation change from the previous sample, meters
    pub elev_delta_m: f64,
    /// Seconds since the previous sample
    pub time_delta_secs: f64,
    /// Instantaneous speed, m/s (0 when `time_delta_secs` is 0)
    pub speed_mps: f64,
    /// Unitless slope (0 when `dist_delta_m` is 0)
    pub gradient: f64,
    /// Slope scaled to percent
    pub gradient_pct: f64,
}

/// Per-recording matrix of best rolling-average speed by window length and
/// gradient bucket
///
/// Rows index the window length in seconds (`0..=max_window_secs`), columns
/// the rounded gradient percentage (`min_gradient..=max_gradient`). A cell
/// holds the fastest rolling-average speed (m/s) any window of that length
/// achieved at that gradient, or 0 if no window ever fell in the bucket.
/// Immutable once built; rebuilding a recording replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedSurface {
    max_window_secs: u32,
    min_gradient: i32,
    max_gradient: i32,
    values: Vec<f64>,
}

impl SpeedSurface {
    /// Create an all-zero surface with the given dimensions
    pub fn zeroed(config: &SurfaceConfig) -> Self {
        Self {
            max_window_secs: config.max_window_secs,
            min_gradient: config.min_gradient,
            max_gradient: config.max_gradient,
            values: vec![0.0; config.rows() * config.cols()],
        }
    }

    /// Reassemble a surface from a dense row grid, e.g. when loading from disk
    ///
    /// `rows[w]` is the row for window length `w`; every row must span the
    /// full gradient range.
    pub fn from_grid(min_gradient: i32, max_gradient: i32, rows: Vec<Vec<f64>>) -> Result<Self> {
        if min_gradient > max_gradient {
            return Err(PaceGridError::MalformedSurface(format!(
                "gradient range [{min_gradient}, {max_gradient}] is inverted"
            )));
        }
        if rows.is_empty() {
            return Err(PaceGridError::MalformedSurface(
                "surface needs at least the zero-length window row".to_string(),
            ));
        }
        let cols = (max_gradient - min_gradient) as usize + 1;
        let mut values = Vec::with_capacity(rows.len() * cols);
        for (w, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(PaceGridError::MalformedSurface(format!(
                    "row {w} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            max_window_secs: (rows.len() - 1) as u32,
            min_gradient,
            max_gradient,
            values,
        })
    }

    pub(crate) fn from_values(like: &SpeedSurface, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), like.values.len());
        Self {
            max_window_secs: like.max_window_secs,
            min_gradient: like.min_gradient,
            max_gradient: like.max_gradient,
            values,
        }
    }

    pub fn max_window_secs(&self) -> u32 {
        self.max_window_secs
    }

    pub fn min_gradient(&self) -> i32 {
        self.min_gradient
    }

    pub fn max_gradient(&self) -> i32 {
        self.max_gradient
    }

    /// (rows, columns) of the dense matrix
    pub fn shape(&self) -> (usize, usize) {
        (
            self.max_window_secs as usize + 1,
            (self.max_gradient - self.min_gradient) as usize + 1,
        )
    }

    /// Whether another surface indexes the same window/gradient space
    pub fn same_shape(&self, other: &SpeedSurface) -> bool {
        self.max_window_secs == other.max_window_secs
            && self.min_gradient == other.min_gradient
            && self.max_gradient == other.max_gradient
    }

    /// The gradient bucket labels, column order
    pub fn gradient_buckets(&self) -> impl Iterator<Item = i32> {
        self.min_gradient..=self.max_gradient
    }

    /// Best speed for a window length at a gradient bucket, if in range
    pub fn get(&self, window_secs: u32, bucket: i32) -> Option<f64> {
        let col = self.col_index(bucket)?;
        if window_secs > self.max_window_secs {
            return None;
        }
        Some(self.values[self.flat_index(window_secs as usize, col)])
    }

    /// The full best-speed-over-time column for one gradient bucket
    pub fn speed_at_gradient(&self, bucket: i32) -> Option<Vec<f64>> {
        let col = self.col_index(bucket)?;
        let (rows, _) = self.shape();
        Some(
            (0..rows)
                .map(|w| self.values[self.flat_index(w, col)])
                .collect(),
        )
    }

    /// One matrix row: best speed per gradient bucket for a window length
    pub fn row(&self, window_secs: u32) -> Option<&[f64]> {
        if window_secs > self.max_window_secs {
            return None;
        }
        let (_, cols) = self.shape();
        let start = window_secs as usize * cols;
        Some(&self.values[start..start + cols])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Write a cell if the bucket lies inside the gradient range; buckets
    /// outside the range are dropped silently.
    pub(crate) fn set(&mut self, window_secs: u32, bucket: i32, value: f64) {
        if window_secs > self.max_window_secs {
            return;
        }
        if let Some(col) = self.col_index(bucket) {
            let idx = self.flat_index(window_secs as usize, col);
            self.values[idx] = value;
        }
    }

    fn col_index(&self, bucket: i32) -> Option<usize> {
        if bucket < self.min_gradient || bucket > self.max_gradient {
            return None;
        }
        Some((bucket - self.min_gradient) as usize)
    }

    fn flat_index(&self, row: usize, col: usize) -> usize {
        row * ((self.max_gradient - self.min_gradient) as usize + 1) + col
    }
}

/// Element-wise maximum over a set of [`SpeedSurface`]s: the best-ever
/// record surface for the selected recordings
///
/// Derived on demand, never persisted; a plain matrix with delegating
/// lookups rather than any table subclassing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSurface {
    grid: SpeedSurface,
    contributing_runs: usize,
}

impl CompositeSurface {
    pub(crate) fn new(grid: SpeedSurface, contributing_runs: usize) -> Self {
        Self {
            grid,
            contributing_runs,
        }
    }

    /// Number of recordings folded into this surface
    pub fn contributing_runs(&self) -> usize {
        self.contributing_runs
    }

    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    pub fn get(&self, window_secs: u32, bucket: i32) -> Option<f64> {
        self.grid.get(window_secs, bucket)
    }

    pub fn speed_at_gradient(&self, bucket: i32) -> Option<Vec<f64>> {
        self.grid.speed_at_gradient(bucket)
    }

    pub fn grid(&self) -> &SpeedSurface {
        &self.grid
    }

    pub fn into_grid(self) -> SpeedSurface {
        self.grid
    }
}

/// One entry of the collaborator's recording index
///
/// The date is kept as the raw string found in the store (a directory name)
/// so that malformed entries surface as `InvalidDate` during selection
/// instead of being silently skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunListing {
    pub recording_id: String,
    pub date: String,
}
