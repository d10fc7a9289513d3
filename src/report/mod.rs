//! Reporting utilities: residuals and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::domain::WeightedObservation;
use crate::error::FitError;
use crate::models::ParametricFunction;

/// Fitted value and residual for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Residual {
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    /// `y_obs - y_fit`.
    pub residual: f64,
    pub weight: f64,
}

/// Compute fitted values and residuals for each observation, sorted by `x`.
pub fn compute_residuals<F: ParametricFunction + ?Sized>(
    function: &F,
    params: &[f64],
    observations: &[WeightedObservation],
) -> Result<Vec<Residual>, FitError> {
    let mut out = Vec::with_capacity(observations.len());
    for obs in observations {
        let y_fit = function.value(obs.x, params)?;
        out.push(Residual {
            x: obs.x,
            y_obs: obs.y,
            y_fit,
            residual: obs.y - y_fit,
            weight: obs.weight,
        });
    }
    out.sort_by(|a, b| a.x.total_cmp(&b.x));
    Ok(out)
}
