//! Composite surface aggregation
//!
//! Folds any number of same-shaped speed surfaces into the element-wise
//! maximum: the personal-record surface for the contributing recordings.

use tracing::debug;

use crate::error::{PaceGridError, Result};
use crate::models::{CompositeSurface, SpeedSurface};

/// Reduces a set of per-recording surfaces into one composite surface
pub struct SurfaceAggregator;

impl SurfaceAggregator {
    /// Element-wise maximum over all given surfaces.
    ///
    /// Pure, commutative and associative: input order never changes the
    /// result. Fails with [`PaceGridError::EmptyInput`] for zero surfaces and
    /// [`PaceGridError::ShapeMismatch`] when any surface indexes a different
    /// window/gradient space than the first.
    pub fn aggregate(surfaces: &[SpeedSurface]) -> Result<CompositeSurface> {
        let first = surfaces.first().ok_or(PaceGridError::EmptyInput)?;

        let mut values = first.as_slice().to_vec();
        for surface in &surfaces[1..] {
            if !surface.same_shape(first) {
                return Err(PaceGridError::ShapeMismatch {
                    expected: first.shape(),
                    actual: surface.shape(),
                });
            }
            for (acc, &v) in values.iter_mut().zip(surface.as_slice()) {
                if v > *acc {
                    *acc = v;
                }
            }
        }

        debug!(surfaces = surfaces.len(), "aggregated composite surface");
        Ok(CompositeSurface::new(
            SpeedSurface::from_values(first, values),
            surfaces.len(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceConfig;
    use proptest::prelude::*;

    fn config() -> SurfaceConfig {
        SurfaceConfig {
            max_window_secs: 2,
            min_gradient: -1,
            max_gradient: 1,
        }
    }

    fn surface(cells: &[(u32, i32, f64)]) -> SpeedSurface {
        let mut s = SpeedSurface::zeroed(&config());
        for &(w, b, v) in cells {
            s.set(w, b, v);
        }
        s
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            SurfaceAggregator::aggregate(&[]),
            Err(PaceGridError::EmptyInput)
        ));
    }

    #[test]
    fn test_single_surface_is_identity() {
        let a = surface(&[(1, 0, 3.0), (2, -1, 1.5)]);
        let composite = SurfaceAggregator::aggregate(std::slice::from_ref(&a)).unwrap();
        assert_eq!(composite.grid(), &a);
        assert_eq!(composite.contributing_runs(), 1);
    }

    #[test]
    fn test_elementwise_maximum() {
        let a = surface(&[(1, 0, 3.0), (2, 1, 2.0)]);
        let b = surface(&[(1, 0, 2.5), (2, 1, 4.0), (0, -1, 1.0)]);
        let composite = SurfaceAggregator::aggregate(&[a, b]).unwrap();
        assert_eq!(composite.get(1, 0), Some(3.0));
        assert_eq!(composite.get(2, 1), Some(4.0));
        assert_eq!(composite.get(0, -1), Some(1.0));
        assert_eq!(composite.contributing_runs(), 2);
    }

    #[test]
    fn test_commutative() {
        let a = surface(&[(1, 0, 3.0), (0, 1, 0.5)]);
        let b = surface(&[(1, 0, 2.0), (2, -1, 6.0)]);
        let ab = SurfaceAggregator::aggregate(&[a.clone(), b.clone()]).unwrap();
        let ba = SurfaceAggregator::aggregate(&[b, a]).unwrap();
        assert_eq!(ab.grid(), ba.grid());
    }

    #[test]
    fn test_associative() {
        let a = surface(&[(1, 0, 3.0)]);
        let b = surface(&[(1, 1, 2.0)]);
        let c = surface(&[(2, -1, 5.0), (1, 0, 4.0)]);

        let abc = SurfaceAggregator::aggregate(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let ab = SurfaceAggregator::aggregate(&[a, b]).unwrap().into_grid();
        let ab_c = SurfaceAggregator::aggregate(&[ab, c]).unwrap();
        assert_eq!(abc.grid(), ab_c.grid());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let a = surface(&[]);
        let wider = SpeedSurface::zeroed(&SurfaceConfig {
            max_window_secs: 2,
            min_gradient: -5,
            max_gradient: 5,
        });
        assert!(matches!(
            SurfaceAggregator::aggregate(&[a, wider]),
            Err(PaceGridError::ShapeMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_aggregation_order_irrelevant(
            cells_a in proptest::collection::vec((0u32..3, -1i32..=1, 0.0f64..20.0), 0..6),
            cells_b in proptest::collection::vec((0u32..3, -1i32..=1, 0.0f64..20.0), 0..6),
        ) {
            let a = surface(&cells_a);
            let b = surface(&cells_b);
            let ab = SurfaceAggregator::aggregate(&[a.clone(), b.clone()]).unwrap();
            let ba = SurfaceAggregator::aggregate(&[b, a]).unwrap();
            prop_assert_eq!(ab.grid(), ba.grid());
        }
    }
}
