//! Speed surface construction
//!
//! For every candidate window length this computes the trailing rolling mean
//! of speed and gradient over a prepared track, buckets each position by its
//! rounded rolling gradient, and keeps the fastest rolling speed per bucket.
//! Stacking one row per window length yields the dense time x gradient
//! surface.

use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use crate::config::SurfaceConfig;
use crate::models::{PreparedSample, SpeedSurface};

/// Builds one [`SpeedSurface`] per prepared recording
#[derive(Debug, Clone)]
pub struct SpeedSurfaceBuilder {
    config: SurfaceConfig,
}

impl SpeedSurfaceBuilder {
    pub fn new(config: SurfaceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Build the surface for one recording.
    ///
    /// Total over well-formed input: a degenerate track (empty, stationary,
    /// or shorter than every window) yields an all-zero or partially-zero
    /// surface rather than an error. Rows are independent, so they are
    /// computed in parallel and joined in window order.
    pub fn build(&self, samples: &[PreparedSample]) -> SpeedSurface {
        let mut surface = SpeedSurface::zeroed(&self.config);
        if samples.is_empty() {
            return surface;
        }

        // Prefix sums make the per-window rolling means O(1) per position
        // instead of recomputing each window from scratch.
        let speed_prefix = prefix_sums(samples.iter().map(|s| s.speed_mps));
        let gradient_prefix = prefix_sums(samples.iter().map(|s| s.gradient_pct));

        let rows: Vec<HashMap<i32, f64>> = (0..=self.config.max_window_secs)
            .into_par_iter()
            .map(|w| window_maxima(w as usize, &speed_prefix, &gradient_prefix))
            .collect();

        for (w, maxima) in rows.into_iter().enumerate() {
            for (bucket, speed) in maxima {
                // Buckets outside the configured range are dropped silently.
                surface.set(w as u32, bucket, speed);
            }
        }

        debug!(
            samples = samples.len(),
            max_window_secs = self.config.max_window_secs,
            "built speed surface"
        );
        surface
    }
}

/// Max rolling speed per rounded gradient bucket for one window length.
///
/// The trailing window is partial at the start of the track: position `i`
/// averages over `min(window, i + 1)` samples. The empty window (`window ==
/// 0`) is defined as zero speed at zero gradient.
fn window_maxima(
    window: usize,
    speed_prefix: &[f64],
    gradient_prefix: &[f64],
) -> HashMap<i32, f64> {
    let n = speed_prefix.len() - 1;
    let mut maxima: HashMap<i32, f64> = HashMap::new();

    for i in 0..n {
        let count = window.min(i + 1);
        let (speed, gradient_pct) = if count == 0 {
            (0.0, 0.0)
        } else {
            let lo = i + 1 - count;
            (
                (speed_prefix[i + 1] - speed_prefix[lo]) / count as f64,
                (gradient_prefix[i + 1] - gradient_prefix[lo]) / count as f64,
            )
        };

        let bucket = gradient_pct.round() as i32;
        let best = maxima.entry(bucket).or_insert(f64::NEG_INFINITY);
        if speed > *best {
            *best = speed;
        }
    }

    maxima
}

fn prefix_sums(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut sums = vec![0.0];
    let mut acc = 0.0;
    for v in values {
        acc += v;
        sums.push(acc);
    }
    sums
}
