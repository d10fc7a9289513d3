//! Levenberg–Marquardt least-squares fitter.
//!
//! Given:
//! - a differentiable model `f(x; p)` (`ParametricFunction`)
//! - observations `(w_i, x_i, y_i)`
//! - a start point `p0`
//!
//! we minimize `Σ w_i (f(x_i; p) - y_i)^2` with Gauss-Newton steps damped by a
//! factor `λ`:
//!
//! - accepted step (SSE decreased): `λ *= lambda_down` (towards Gauss-Newton)
//! - rejected step: `λ *= lambda_up` (towards scaled gradient descent)
//!
//! The loop stops when an accepted step is tiny relative to `p`, when the
//! relative SSE decrease drops below `cost_tolerance`, or when the iteration
//! budget runs out. Running out of iterations is not an error: the best point
//! found is returned with `converged = false`.
//!
//! All working state (`p`, `λ`, buffers) is local to `fit`, so a single
//! `LeastSquaresFitter` can be shared across threads.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace, warn};

use crate::domain::{FitOutcome, WeightedObservation};
use crate::error::FitError;
use crate::math::{normal_equations, solve_damped};
use crate::models::{ParametricFunction, check_len, weighted_sse};

/// Tunables for the optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergOptions {
    pub max_iterations: usize,
    /// Damping factor at the start of every fit.
    pub initial_lambda: f64,
    /// Factor applied to `λ` after a rejected step or failed solve.
    pub lambda_up: f64,
    /// Factor applied to `λ` after an accepted step.
    pub lambda_down: f64,
    /// `λ` is never driven below this.
    pub min_lambda: f64,
    /// Past this the method is stuck.
    pub max_lambda: f64,
    /// Solve attempts per iteration before giving up.
    pub max_solve_retries: usize,
    /// Relative step size tolerance: `‖Δ‖ <= tol * (‖p‖ + tol)`.
    pub step_tolerance: f64,
    /// Relative SSE decrease tolerance.
    pub cost_tolerance: f64,
}

impl Default for LevenbergOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e16,
            max_solve_retries: 32,
            step_tolerance: 1e-10,
            cost_tolerance: 1e-10,
        }
    }
}

impl LevenbergOptions {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    fn validate(&self) -> Result<(), FitError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if self.max_iterations == 0 {
            return Err(FitError::InvalidArgument("max_iterations must be >= 1".to_string()));
        }
        if !(positive(self.initial_lambda) && positive(self.min_lambda) && positive(self.max_lambda)) {
            return Err(FitError::InvalidArgument("damping bounds must be finite and > 0".to_string()));
        }
        if !(self.lambda_up > 1.0 && self.lambda_down > 0.0 && self.lambda_down < 1.0) {
            return Err(FitError::InvalidArgument(
                "lambda_up must be > 1 and lambda_down in (0, 1)".to_string(),
            ));
        }
        if !(positive(self.step_tolerance) && positive(self.cost_tolerance)) {
            return Err(FitError::InvalidArgument("tolerances must be finite and > 0".to_string()));
        }
        Ok(())
    }
}

/// Weighted nonlinear least-squares fitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastSquaresFitter {
    options: LevenbergOptions,
}

impl LeastSquaresFitter {
    pub fn new(options: LevenbergOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LevenbergOptions {
        &self.options
    }

    /// Fit `function` to `observations` starting from `start`.
    pub fn fit<F: ParametricFunction + ?Sized>(
        &self,
        function: &F,
        start: &[f64],
        observations: &[WeightedObservation],
    ) -> Result<FitOutcome, FitError> {
        let opts = &self.options;
        opts.validate()?;

        if observations.is_empty() {
            return Err(FitError::InsufficientData);
        }
        let k = function.param_count();
        if start.len() != k {
            return Err(FitError::DimensionMismatch {
                expected: k,
                found: start.len(),
            });
        }
        if let Some(bad) = observations
            .iter()
            .find(|o| !(o.weight.is_finite() && o.weight >= 0.0))
        {
            return Err(FitError::InvalidArgument(format!(
                "observation weight must be finite and >= 0, got {}",
                bad.weight
            )));
        }

        let n = observations.len();
        let sqrt_w: Vec<f64> = observations.iter().map(|o| o.weight.sqrt()).collect();

        let mut params = DVector::from_column_slice(start);
        let mut cost = weighted_sse(function, params.as_slice(), observations)?;
        if !cost.is_finite() {
            return Err(FitError::NonConvergent(format!(
                "objective is not finite at the start point ({cost})"
            )));
        }

        let mut lambda = opts.initial_lambda;
        let mut converged = cost == 0.0;
        let mut accepted_any = false;
        let mut iterations = 0usize;

        let mut jacobian = DMatrix::<f64>::zeros(n, k);
        let mut residuals = DVector::<f64>::zeros(n);

        while !converged && iterations < opts.max_iterations {
            iterations += 1;

            for (i, obs) in observations.iter().enumerate() {
                let value = function.value(obs.x, params.as_slice())?;
                let grad = function.gradient(obs.x, params.as_slice())?;
                check_len(&grad, k)?;
                residuals[i] = sqrt_w[i] * (value - obs.y);
                for (j, g) in grad.iter().enumerate() {
                    jacobian[(i, j)] = sqrt_w[i] * g;
                }
            }
            let (jtj, jtr) = normal_equations(&jacobian, &residuals);

            let step = solve_with_retries(&jtj, &jtr, &mut lambda, opts)?;

            let trial = &params + &step;
            // A trial point the model rejects (e.g. shape exponent <= 0) counts as
            // a failed step, not a failed fit.
            let trial_cost = weighted_sse(function, trial.as_slice(), observations)
                .ok()
                .filter(|c| c.is_finite());

            let step_norm = step.norm();
            let small_step = step_norm <= opts.step_tolerance * (params.norm() + opts.step_tolerance);

            match trial_cost {
                Some(trial_cost) if trial_cost < cost => {
                    let relative_decrease = (cost - trial_cost) / cost;
                    params = trial;
                    cost = trial_cost;
                    lambda = (lambda * opts.lambda_down).max(opts.min_lambda);
                    accepted_any = true;
                    trace!(iterations, cost, lambda, step_norm, "accepted step");

                    if cost == 0.0 || small_step || relative_decrease <= opts.cost_tolerance {
                        converged = true;
                    }
                }
                _ => {
                    lambda *= opts.lambda_up;
                    trace!(iterations, cost, lambda, step_norm, "rejected step");

                    // No improving step left after real progress: either the step
                    // has collapsed or the damping has saturated.
                    if accepted_any && (small_step || lambda > opts.max_lambda) {
                        converged = true;
                    }
                }
            }
        }

        if converged {
            debug!(iterations, cost, lambda, "levenberg-marquardt converged");
        } else {
            warn!(
                iterations,
                cost, "levenberg-marquardt hit the iteration cap; returning best parameters"
            );
        }

        Ok(FitOutcome {
            parameters: params.iter().copied().collect(),
            iterations,
            converged,
            sse: cost,
            rmse: (cost / n as f64).sqrt(),
            lambda,
            observations: n,
        })
    }
}

/// Solve the damped system, raising `λ` after each failed attempt.
fn solve_with_retries(
    jtj: &DMatrix<f64>,
    jtr: &DVector<f64>,
    lambda: &mut f64,
    opts: &LevenbergOptions,
) -> Result<DVector<f64>, FitError> {
    let mut last_err = FitError::SingularSystem;
    for attempt in 0..=opts.max_solve_retries {
        if *lambda > opts.max_lambda {
            break;
        }
        match solve_damped(jtj, jtr, *lambda) {
            Ok(step) => return Ok(step),
            Err(err) => {
                trace!(attempt, lambda = *lambda, "singular normal equations; increasing damping");
                *lambda *= opts.lambda_up;
                last_err = err;
            }
        }
    }
    Err(FitError::NonConvergent(format!(
        "{last_err} after {} retries (lambda={lambda:e})",
        opts.max_solve_retries
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{GeneralizedLogistic, ReducedParametricFunction, check_len};

    const BASE: [f64; 6] = [1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    fn midpoint_growth() -> ReducedParametricFunction {
        ReducedParametricFunction::new(Arc::new(GeneralizedLogistic), &BASE, &[1, 2]).unwrap()
    }

    fn synthetic(f: &dyn ParametricFunction, params: &[f64], xs: &[f64]) -> Vec<WeightedObservation> {
        xs.iter()
            .map(|&x| WeightedObservation::new(1.0, x, f.value(x, params).unwrap()))
            .collect()
    }

    fn hdi_grid() -> Vec<f64> {
        (0..25).map(|i| 0.3 + 0.025 * i as f64).collect()
    }

    #[test]
    fn recovers_exact_parameters_from_noise_free_data() {
        let f = midpoint_growth();
        let truth = [0.62, 12.0];
        let obs = synthetic(&f, &truth, &hdi_grid());

        let fitter = LeastSquaresFitter::default();
        let out = fitter.fit(&f, &[0.5, 20.0], &obs).unwrap();

        assert!(out.converged, "{out:?}");
        assert!(out.iterations < fitter.options().max_iterations);
        assert!((out.parameters[0] - truth[0]).abs() < 1e-4, "{out:?}");
        assert!((out.parameters[1] - truth[1]).abs() < 1e-4, "{out:?}");
        assert!(out.sse < 1e-12);
    }

    #[test]
    fn recovers_upper_asymptote_too() {
        let f = ReducedParametricFunction::new(Arc::new(GeneralizedLogistic), &BASE, &[0, 1, 2]).unwrap();
        let truth = [0.93, 0.58, 10.0];
        let obs = synthetic(&f, &truth, &hdi_grid());

        let out = LeastSquaresFitter::default().fit(&f, &[1.0, 0.5, 15.0], &obs).unwrap();
        assert!(out.converged, "{out:?}");
        for (got, want) in out.parameters.iter().zip(truth.iter()) {
            assert!((got - want).abs() < 1e-4, "{out:?}");
        }
    }

    #[test]
    fn empty_observations_fail_with_insufficient_data() {
        let f = midpoint_growth();
        let err = LeastSquaresFitter::default().fit(&f, &[0.5, 20.0], &[]).unwrap_err();
        assert_eq!(err, FitError::InsufficientData);
    }

    #[test]
    fn wrong_start_length_fails_with_dimension_mismatch() {
        let f = midpoint_growth();
        let obs = synthetic(&f, &[0.6, 10.0], &hdi_grid());
        let err = LeastSquaresFitter::default().fit(&f, &[0.5], &obs).unwrap_err();
        assert_eq!(err, FitError::DimensionMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn negative_weight_is_rejected() {
        let f = midpoint_growth();
        let obs = [WeightedObservation::new(-1.0, 0.5, 0.5)];
        let err = LeastSquaresFitter::default().fit(&f, &[0.5, 20.0], &obs).unwrap_err();
        assert!(matches!(err, FitError::InvalidArgument(_)));
    }

    #[test]
    fn underdetermined_single_point_still_returns_parameters() {
        let f = midpoint_growth();
        let obs = [WeightedObservation::new(1.0, 0.9, 0.99)];
        let out = LeastSquaresFitter::default().fit(&f, &[0.5, 20.0], &obs).unwrap();

        assert_eq!(out.parameters.len(), 2);
        assert!(out.parameters.iter().all(|v| v.is_finite()));
        assert!(out.sse <= (f.value(0.9, &[0.5, 20.0]).unwrap() - 0.99).powi(2));
    }

    #[test]
    fn iteration_cap_returns_best_so_far_without_error() {
        let f = midpoint_growth();
        let obs = synthetic(&f, &[0.62, 12.0], &hdi_grid());
        let start_cost = weighted_sse(&f, &[0.5, 20.0], &obs).unwrap();

        let fitter = LeastSquaresFitter::new(LevenbergOptions::default().with_max_iterations(1));
        let out = fitter.fit(&f, &[0.5, 20.0], &obs).unwrap();
        assert_eq!(out.iterations, 1);
        assert!(!out.converged);
        assert!(out.sse <= start_cost);
    }

    #[test]
    fn zero_weight_observations_do_not_pull_the_fit() {
        let f = midpoint_growth();
        let truth = [0.6, 11.0];
        let mut obs = synthetic(&f, &truth, &hdi_grid());
        obs.push(WeightedObservation::new(0.0, 0.5, 5.0));

        let out = LeastSquaresFitter::default().fit(&f, &[0.5, 20.0], &obs).unwrap();
        assert!((out.parameters[0] - truth[0]).abs() < 1e-4);
        assert!((out.parameters[1] - truth[1]).abs() < 1e-4);
    }

    #[test]
    fn observation_order_does_not_change_the_fit() {
        let f = midpoint_growth();
        let xs = hdi_grid();
        let mut obs: Vec<WeightedObservation> = xs
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let wobble = if i % 2 == 0 { 0.01 } else { -0.01 };
                WeightedObservation::new(1.0, x, f.value(x, &[0.6, 9.0]).unwrap() + wobble)
            })
            .collect();

        let fitter = LeastSquaresFitter::default();
        let forward = fitter.fit(&f, &[0.5, 20.0], &obs).unwrap();
        obs.reverse();
        let backward = fitter.fit(&f, &[0.5, 20.0], &obs).unwrap();

        for (a, b) in forward.parameters.iter().zip(backward.parameters.iter()) {
            assert!((a - b).abs() < 1e-6, "{forward:?} vs {backward:?}");
        }
    }

    struct Quadratic;

    impl ParametricFunction for Quadratic {
        fn param_count(&self) -> usize {
            3
        }

        fn value(&self, x: f64, p: &[f64]) -> Result<f64, FitError> {
            check_len(p, 3)?;
            Ok(p[0] + p[1] * x + p[2] * x * x)
        }

        fn gradient(&self, x: f64, p: &[f64]) -> Result<Vec<f64>, FitError> {
            check_len(p, 3)?;
            Ok(vec![1.0, x, x * x])
        }
    }

    #[test]
    fn works_with_any_parametric_function() {
        let obs: Vec<WeightedObservation> = (0..10)
            .map(|i| {
                let x = i as f64;
                WeightedObservation::new(1.0, x, 1.0 - 2.0 * x + 0.5 * x * x)
            })
            .collect();
        let out = LeastSquaresFitter::default().fit(&Quadratic, &[0.0, 0.0, 0.0], &obs).unwrap();
        assert!(out.converged);
        assert!((out.parameters[0] - 1.0).abs() < 1e-6);
        assert!((out.parameters[1] + 2.0).abs() < 1e-6);
        assert!((out.parameters[2] - 0.5).abs() < 1e-6);
    }

    /// Straight line `p0 + p1 * x` whose gradient has `len` entries.
    struct Line {
        gradient_len: usize,
    }

    impl ParametricFunction for Line {
        fn param_count(&self) -> usize {
            2
        }

        fn value(&self, x: f64, p: &[f64]) -> Result<f64, FitError> {
            check_len(p, 2)?;
            Ok(p[0] + p[1] * x)
        }

        fn gradient(&self, x: f64, p: &[f64]) -> Result<Vec<f64>, FitError> {
            check_len(p, 2)?;
            let mut g = vec![1.0, x, x * x];
            g.resize(self.gradient_len, 0.0);
            Ok(g)
        }
    }

    fn line_observations() -> Vec<WeightedObservation> {
        (0..5)
            .map(|i| WeightedObservation::new(1.0, i as f64, 1.0 + 2.0 * i as f64))
            .collect()
    }

    #[test]
    fn short_gradient_is_a_dimension_mismatch() {
        let err = LeastSquaresFitter::default()
            .fit(&Line { gradient_len: 1 }, &[0.0, 0.0], &line_observations())
            .unwrap_err();
        assert_eq!(err, FitError::DimensionMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn long_gradient_is_a_dimension_mismatch() {
        let err = LeastSquaresFitter::default()
            .fit(&Line { gradient_len: 3 }, &[0.0, 0.0], &line_observations())
            .unwrap_err();
        assert_eq!(err, FitError::DimensionMismatch { expected: 2, found: 3 });
    }

    #[test]
    fn line_with_matching_gradient_fits_exactly() {
        let out = LeastSquaresFitter::default()
            .fit(&Line { gradient_len: 2 }, &[0.0, 0.0], &line_observations())
            .unwrap();
        assert!((out.parameters[0] - 1.0).abs() < 1e-6, "{out:?}");
        assert!((out.parameters[1] - 2.0).abs() < 1e-6, "{out:?}");
    }

    /// Finite values, NaN slopes: every damped solve fails.
    struct NanGradient;

    impl ParametricFunction for NanGradient {
        fn param_count(&self) -> usize {
            2
        }

        fn value(&self, x: f64, p: &[f64]) -> Result<f64, FitError> {
            check_len(p, 2)?;
            Ok(p[0] + p[1] * x)
        }

        fn gradient(&self, _x: f64, p: &[f64]) -> Result<Vec<f64>, FitError> {
            check_len(p, 2)?;
            Ok(vec![f64::NAN, f64::NAN])
        }
    }

    #[test]
    fn exhausted_solve_retries_are_non_convergent() {
        let err = LeastSquaresFitter::default()
            .fit(&NanGradient, &[0.0, 0.0], &line_observations())
            .unwrap_err();
        match err {
            FitError::NonConvergent(msg) => assert!(msg.contains("singular"), "{msg}"),
            other => panic!("expected NonConvergent, got {other:?}"),
        }
    }

    /// Constant model that cannot move: every step is rejected.
    struct Stuck;

    impl ParametricFunction for Stuck {
        fn param_count(&self) -> usize {
            1
        }

        fn value(&self, _x: f64, p: &[f64]) -> Result<f64, FitError> {
            check_len(p, 1)?;
            Ok(if p[0] == 0.0 { 0.0 } else { 10.0 })
        }

        fn gradient(&self, _x: f64, p: &[f64]) -> Result<Vec<f64>, FitError> {
            check_len(p, 1)?;
            Ok(vec![1.0])
        }
    }

    #[test]
    fn saturated_damping_without_progress_is_not_converged() {
        let obs = [WeightedObservation::new(1.0, 0.0, 1.0)];
        let result = LeastSquaresFitter::new(LevenbergOptions::default().with_max_iterations(50))
            .fit(&Stuck, &[0.0], &obs);
        match result {
            Ok(out) => assert!(!out.converged, "{out:?}"),
            Err(err) => assert!(matches!(err, FitError::NonConvergent(_)), "{err:?}"),
        }
    }
}
