//! Track preparation: derives per-sample kinematics from a raw GPS track
//!
//! Turns an ordered sequence of raw points into distance, elevation and time
//! deltas plus instantaneous speed and gradient, then clamps gradient
//! outliers to the track median.

use statrs::statistics::{Data, OrderStatistics};
use tracing::debug;

use crate::error::{PaceGridError, Result};
use crate::models::{PreparedSample, RawPoint};

/// Spherical-earth radius used for great-circle distances, meters.
/// Callers must not assume better than spherical accuracy.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Gradient magnitude (45 degrees) above which a sample is treated as a GPS
/// artifact and replaced by the track median.
const MAX_ABS_GRADIENT: f64 = 1.0;

/// Cleans a raw point sequence into a derived kinematic table
pub struct TrackPreparer;

impl TrackPreparer {
    /// Prepare a track for surface building.
    ///
    /// Fails with [`PaceGridError::EmptyTrack`] on an empty sequence and
    /// [`PaceGridError::ClockOrder`] if timestamps regress. Output length
    /// always equals input length; the first sample has all-zero deltas.
    pub fn prepare(points: &[RawPoint]) -> Result<Vec<PreparedSample>> {
        if points.is_empty() {
            return Err(PaceGridError::EmptyTrack);
        }

        let start = points[0].time;
        let mut samples = Vec::with_capacity(points.len());
        samples.push(PreparedSample {
            elapsed_secs: 0.0,
            dist_delta_m: 0.0,
            elev_delta_m: 0.0,
            time_delta_secs: 0.0,
            speed_mps: 0.0,
            gradient: 0.0,
            gradient_pct: 0.0,
        });

        for (index, pair) in points.windows(2).enumerate() {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.time < prev.time {
                return Err(PaceGridError::ClockOrder {
                    index: index + 1,
                    previous: prev.time,
                    current: curr.time,
                });
            }

            let dist_delta_m = haversine_m(
                prev.latitude,
                prev.longitude,
                curr.latitude,
                curr.longitude,
            );
            let elev_delta_m = curr.elevation - prev.elevation;
            let time_delta_secs = (curr.time - prev.time).num_milliseconds() as f64 / 1000.0;

            // Zero denominators are defined as zero, not an error, so the
            // pipeline stays total over duplicate timestamps and stationary
            // points.
            let speed_mps = if time_delta_secs != 0.0 {
                dist_delta_m / time_delta_secs
            } else {
                0.0
            };
            let gradient = if dist_delta_m != 0.0 {
                elev_delta_m / dist_delta_m
            } else {
                0.0
            };

            samples.push(PreparedSample {
                elapsed_secs: (curr.time - start).num_milliseconds() as f64 / 1000.0,
                dist_delta_m,
                elev_delta_m,
                time_delta_secs,
                speed_mps,
                gradient,
                gradient_pct: gradient * 100.0,
            });
        }

        clamp_gradient_outliers(&mut samples);
        Ok(samples)
    }
}

/// Replace gradients steeper than 45 degrees with the track median.
///
/// One corrective pass: the median is taken over the original, uncorrected
/// distribution, then every outlier is rewritten with that single value.
fn clamp_gradient_outliers(samples: &mut [PreparedSample]) {
    let gradients: Vec<f64> = samples.iter().map(|s| s.gradient).collect();
    let mut outliers = 0usize;
    let mut median = None;

    for sample in samples.iter_mut() {
        if sample.gradient.abs() > MAX_ABS_GRADIENT {
            let median =
                *median.get_or_insert_with(|| Data::new(gradients.clone()).median());
            sample.gradient = median;
            sample.gradient_pct = median * 100.0;
            outliers += 1;
        }
    }

    if outliers > 0 {
        debug!(outliers, "clamped gradient outliers to track median");
    }
}

/// Great-circle distance between two coordinates on a spherical earth, meters
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()
    }

    fn point(secs: i64, latitude: f64, elevation: f64) -> RawPoint {
        RawPoint {
            time: ts(secs),
            latitude,
            longitude: 7.0,
            elevation,
        }
    }

    /// Degrees of latitude spanning the given distance in meters
    fn lat_degrees_for(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_M).to_degrees()
    }

    #[test]
    fn test_empty_track_rejected() {
        assert!(matches!(
            TrackPreparer::prepare(&[]),
            Err(PaceGridError::EmptyTrack)
        ));
    }

    #[test]
    fn test_clock_regression_rejected() {
        let points = vec![point(10, 45.0, 100.0), point(0, 45.0001, 100.0)];
        match TrackPreparer::prepare(&points) {
            Err(PaceGridError::ClockOrder { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected ClockOrder, got {other:?}"),
        }
    }

    #[test]
    fn test_first_sample_deltas_zero() {
        let points = vec![point(0, 45.0, 100.0), point(5, 45.001, 102.0)];
        let samples = TrackPreparer::prepare(&points).unwrap();
        assert_eq!(samples.len(), points.len());
        let first = &samples[0];
        assert_eq!(first.dist_delta_m, 0.0);
        assert_eq!(first.elev_delta_m, 0.0);
        assert_eq!(first.time_delta_secs, 0.0);
        assert_eq!(first.speed_mps, 0.0);
        assert_eq!(first.gradient, 0.0);
    }

    #[test]
    fn test_speed_over_known_distance() {
        // Two points 1000 m apart along a meridian, 100 s apart.
        let points = vec![
            point(0, 45.0, 100.0),
            point(100, 45.0 + lat_degrees_for(1000.0), 100.0),
        ];
        let samples = TrackPreparer::prepare(&points).unwrap();
        assert!((samples[1].dist_delta_m - 1000.0).abs() < 0.5);
        assert!((samples[1].speed_mps - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_duplicate_timestamp_yields_zero_speed() {
        let points = vec![point(0, 45.0, 100.0), point(0, 45.001, 100.0)];
        let samples = TrackPreparer::prepare(&points).unwrap();
        assert!(samples[1].dist_delta_m > 0.0);
        assert_eq!(samples[1].speed_mps, 0.0);
    }

    #[test]
    fn test_stationary_point_yields_zero_gradient() {
        let points = vec![point(0, 45.0, 100.0), point(10, 45.0, 150.0)];
        let samples = TrackPreparer::prepare(&points).unwrap();
        assert_eq!(samples[1].gradient, 0.0);
        assert_eq!(samples[1].speed_mps, 0.0);
    }

    #[test]
    fn test_gradient_outlier_clamped_to_original_median() {
        let step = lat_degrees_for(100.0);
        let spike = lat_degrees_for(1.0);
        // Three ~10% climbs followed by a 1000 m climb over one meter.
        let points = vec![
            point(0, 45.0, 100.0),
            point(30, 45.0 + step, 110.0),
            point(60, 45.0 + 2.0 * step, 120.0),
            point(90, 45.0 + 3.0 * step, 130.0),
            point(120, 45.0 + 3.0 * step + spike, 1130.0),
        ];
        let samples = TrackPreparer::prepare(&points).unwrap();

        // Median of the original distribution [0, ~0.1, ~0.1, ~0.1, 1000]
        assert!((samples[4].gradient - 0.1).abs() < 1e-3);
        assert!((samples[4].gradient_pct - 10.0).abs() < 0.1);
        // Inliers untouched
        assert!((samples[1].gradient - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_haversine_meridian() {
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        // One degree of latitude on a 6371 km sphere
        assert!((d - 111_194.9).abs() < 1.0);
    }
}
