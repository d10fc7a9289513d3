//! The parametric function seam.
//!
//! The fitter relies on two primitive operations of a model `f(x; p)`:
//! - its value at `x` (for residuals and predictions)
//! - its gradient with respect to `p` at `x` (one Jacobian row)
//!
//! Both validate the parameter vector length and fail with
//! `FitError::DimensionMismatch` instead of reading out of bounds.

use crate::domain::WeightedObservation;
use crate::error::FitError;

/// A differentiable function of one variable with a fixed number of parameters.
pub trait ParametricFunction: Send + Sync {
    /// Length of the parameter vector accepted by `value` and `gradient`.
    fn param_count(&self) -> usize;

    fn value(&self, x: f64, params: &[f64]) -> Result<f64, FitError>;

    /// Partial derivatives with respect to each parameter, in parameter order.
    fn gradient(&self, x: f64, params: &[f64]) -> Result<Vec<f64>, FitError>;
}

/// Fail with `DimensionMismatch` unless `params` has `expected` entries.
pub fn check_len(params: &[f64], expected: usize) -> Result<(), FitError> {
    if params.len() != expected {
        return Err(FitError::DimensionMismatch {
            expected,
            found: params.len(),
        });
    }
    Ok(())
}

/// Weighted sum of squared residuals `Σ w_i (f(x_i) - y_i)^2`.
pub fn weighted_sse<F: ParametricFunction + ?Sized>(
    function: &F,
    params: &[f64],
    observations: &[WeightedObservation],
) -> Result<f64, FitError> {
    let mut sse = 0.0;
    for obs in observations {
        let r = function.value(obs.x, params)? - obs.y;
        sse += obs.weight * r * r;
    }
    Ok(sse)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line;

    impl ParametricFunction for Line {
        fn param_count(&self) -> usize {
            2
        }

        fn value(&self, x: f64, params: &[f64]) -> Result<f64, FitError> {
            check_len(params, 2)?;
            Ok(params[0] + params[1] * x)
        }

        fn gradient(&self, x: f64, params: &[f64]) -> Result<Vec<f64>, FitError> {
            check_len(params, 2)?;
            Ok(vec![1.0, x])
        }
    }

    #[test]
    fn weighted_sse_scales_by_weight() {
        let obs = [
            WeightedObservation::new(1.0, 0.0, 1.0),
            WeightedObservation::new(4.0, 1.0, 0.0),
            WeightedObservation::new(0.0, 2.0, 100.0),
        ];
        // f = x: residuals -1, 1, -98
        let sse = weighted_sse(&Line, &[0.0, 1.0], &obs).unwrap();
        assert!((sse - 5.0).abs() < 1e-12);
    }

    #[test]
    fn check_len_reports_both_lengths() {
        let err = check_len(&[1.0, 2.0, 3.0], 2).unwrap_err();
        assert_eq!(err, FitError::DimensionMismatch { expected: 2, found: 3 });
    }
}
