//! Per-year fitting over a fixed dataset.
//!
//! A `FitSession` owns the ingested entries and one configured model (reduced
//! logistic + start point + optimizer options). Every `fit_by_year` call maps
//! that year's entries to observations and runs a fresh optimizer from the same
//! start point, so results do not depend on call order and concurrent calls
//! share nothing mutable.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{Entry, FitOutcome, WeightedObservation};
use crate::error::FitError;
use crate::fit::levenberg::{LeastSquaresFitter, LevenbergOptions};
use crate::io::observations::map_by_year;
use crate::models::{GeneralizedLogistic, ParametricFunction, ReducedParametricFunction};

/// Base logistic parameters `[k, m, b, q, a, n]` of the reference model.
pub const DEFAULT_BASE_PARAMETERS: [f64; 6] = [1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
/// Free slots of the reference model: midpoint `m` and growth rate `b`.
pub const DEFAULT_FREE_INDEX: [isize; 2] = [1, 2];
/// Start point for `[m, b]`: midpoint 0.5, transition width 0.05.
pub const DEFAULT_START_POINT: [f64; 2] = [0.5, 1.0 / 0.05];
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct FitSession {
    entries: Vec<Entry>,
    function: ReducedParametricFunction,
    start: Vec<f64>,
    fitter: LeastSquaresFitter,
}

impl FitSession {
    /// Build a session; fails if `start` does not match the model's free count.
    pub fn new(
        entries: Vec<Entry>,
        function: ReducedParametricFunction,
        start: Vec<f64>,
        options: LevenbergOptions,
    ) -> Result<Self, FitError> {
        if start.len() != function.param_count() {
            return Err(FitError::DimensionMismatch {
                expected: function.param_count(),
                found: start.len(),
            });
        }
        info!(entries = entries.len(), free = function.param_count(), "fit session ready");
        Ok(Self {
            entries,
            function,
            start,
            fitter: LeastSquaresFitter::new(options),
        })
    }

    /// The reference configuration: fit `m` and `b` of a unit logistic.
    pub fn hdi_tap_default(entries: Vec<Entry>, max_iterations: usize) -> Result<Self, FitError> {
        let function = ReducedParametricFunction::new(
            Arc::new(GeneralizedLogistic),
            &DEFAULT_BASE_PARAMETERS,
            &DEFAULT_FREE_INDEX,
        )?;
        Self::new(
            entries,
            function,
            DEFAULT_START_POINT.to_vec(),
            LevenbergOptions::default().with_max_iterations(max_iterations),
        )
    }

    /// Observations the session would fit for `year`.
    pub fn observations(&self, year: i32) -> Vec<WeightedObservation> {
        map_by_year(&self.entries, year)
    }

    /// Fit the model to one year's data.
    pub fn fit_by_year(&self, year: i32) -> Result<FitOutcome, FitError> {
        let observations = self.observations(year);
        debug!(year, n = observations.len(), "fitting year");
        let outcome = self.fitter.fit(&self.function, &self.start, &observations)?;
        info!(
            year,
            n = outcome.observations,
            iterations = outcome.iterations,
            converged = outcome.converged,
            sse = outcome.sse,
            "fit complete"
        );
        Ok(outcome)
    }

    /// Fit several years in parallel; results come back in request order.
    pub fn fit_years(&self, years: &[i32]) -> Vec<(i32, Result<FitOutcome, FitError>)> {
        years
            .par_iter()
            .map(|&year| (year, self.fit_by_year(year)))
            .collect()
    }

    /// Complete native parameter vector for a fitted outcome.
    pub fn full_parameters(&self, outcome: &FitOutcome) -> Result<Vec<f64>, FitError> {
        self.function.expand(&outcome.parameters)
    }
}
