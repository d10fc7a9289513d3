//! Shared "fit pipeline" logic.
//!
//! ingest -> reduced logistic model -> per-year LM fits -> expanded parameters
//!
//! The binary only prints what this returns, so the whole workflow is testable
//! in-process (see `tests/`).

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{FitConfig, LogisticParam, YearFit};
use crate::error::{AppError, FitError};
use crate::fit::levenberg::LevenbergOptions;
use crate::fit::session::{DEFAULT_BASE_PARAMETERS, FitSession};
use crate::io::ingest::{IngestedEntries, load_entries};
use crate::models::{GeneralizedLogistic, ReducedParametricFunction};

/// All computed outputs of a single `taphdi fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedEntries,
    /// Years fitted, in output order.
    pub years: Vec<i32>,
    pub fits: Vec<YearFit>,
}

impl RunOutput {
    /// First failed year, if any.
    pub fn first_failure(&self) -> Option<(i32, &FitError)> {
        self.fits
            .iter()
            .find_map(|fit| fit.result.as_ref().err().map(|e| (fit.year, e)))
    }
}

/// Load the input named by `config` and fit every requested year.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingest = load_entries(config.input.as_deref())?;
    run_fit_with_entries(config, ingest)
}

/// Same as [`run_fit`] with pre-loaded entries.
pub fn run_fit_with_entries(config: &FitConfig, ingest: IngestedEntries) -> Result<RunOutput, AppError> {
    let session = build_session(config, &ingest)?;

    let years = if config.all_years {
        crate::io::observations::years(&ingest.entries)
    } else {
        config.years.clone()
    };
    if years.is_empty() {
        return Err(AppError::new(3, "No years to fit."));
    }

    let fits: Vec<YearFit> = session
        .fit_years(&years)
        .into_iter()
        .map(|(year, result)| {
            let full_parameters = match &result {
                Ok(outcome) => session.full_parameters(outcome).ok(),
                Err(err) => {
                    warn!(year, error = %err, "year fit failed");
                    None
                }
            };
            YearFit {
                year,
                observations: session.observations(year),
                result,
                full_parameters,
            }
        })
        .collect();

    info!(
        years = years.len(),
        failed = fits.iter().filter(|f| f.result.is_err()).count(),
        "fit run complete"
    );

    Ok(RunOutput { ingest, years, fits })
}

/// Unit logistic with `free` exposed as the fitted parameters.
pub fn reduced_logistic(free: &[LogisticParam]) -> Result<ReducedParametricFunction, FitError> {
    if free.is_empty() {
        return Err(FitError::InvalidArgument(
            "at least one free parameter is required".to_string(),
        ));
    }
    let free_index: Vec<isize> = free.iter().map(|p| p.index() as isize).collect();
    ReducedParametricFunction::new(Arc::new(GeneralizedLogistic), &DEFAULT_BASE_PARAMETERS, &free_index)
}

fn build_session(config: &FitConfig, ingest: &IngestedEntries) -> Result<FitSession, AppError> {
    let function = reduced_logistic(&config.free)?;
    let options = LevenbergOptions::default().with_max_iterations(config.max_iterations);
    let session = FitSession::new(ingest.entries.clone(), function, config.start.clone(), options)?;
    Ok(session)
}
