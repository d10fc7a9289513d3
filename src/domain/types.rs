//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON
//! - written back out as `year;hdi;tap` lines (synthetic samples)

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// One country-year record: human development index and tap water prevalence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub year: i32,
    pub hdi: f64,
    pub tap_prevalence: f64,
}

impl Entry {
    pub fn new(year: i32, hdi: f64, tap_prevalence: f64) -> Self {
        Self {
            year,
            hdi,
            tap_prevalence,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.year, self.hdi, self.tap_prevalence)
    }
}

/// Parse the three raw fields of a `year;hdi;tapPrevalence` record.
///
/// `NaN` and infinities are rejected along with non-numeric text.
pub fn parse_fields(year: &str, hdi: &str, tap: &str) -> Result<Entry, String> {
    let year = year
        .parse::<i32>()
        .map_err(|e| format!("invalid year '{year}': {e}"))?;
    let hdi = hdi
        .parse::<f64>()
        .map_err(|e| format!("invalid hdi '{hdi}': {e}"))?;
    let tap_prevalence = tap
        .parse::<f64>()
        .map_err(|e| format!("invalid tap prevalence '{tap}': {e}"))?;
    if !hdi.is_finite() {
        return Err(format!("hdi must be finite, got {hdi}"));
    }
    if !tap_prevalence.is_finite() {
        return Err(format!("tap prevalence must be finite, got {tap_prevalence}"));
    }
    Ok(Entry::new(year, hdi, tap_prevalence))
}

/// A point in the least-squares objective: `weight * (f(x) - y)^2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedObservation {
    pub weight: f64,
    pub x: f64,
    pub y: f64,
}

impl WeightedObservation {
    pub fn new(weight: f64, x: f64, y: f64) -> Self {
        Self { weight, x, y }
    }
}

/// Parameters of the generalized logistic curve, in native order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogisticParam {
    /// Upper asymptote.
    K,
    /// Midpoint.
    M,
    /// Growth rate.
    B,
    /// Midpoint scaling.
    Q,
    /// Lower asymptote.
    A,
    /// Shape exponent (asymmetry).
    N,
}

impl LogisticParam {
    pub const ALL: [LogisticParam; 6] = [
        LogisticParam::K,
        LogisticParam::M,
        LogisticParam::B,
        LogisticParam::Q,
        LogisticParam::A,
        LogisticParam::N,
    ];

    /// Position in the full 6-parameter vector.
    pub fn index(self) -> usize {
        match self {
            LogisticParam::K => 0,
            LogisticParam::M => 1,
            LogisticParam::B => 2,
            LogisticParam::Q => 3,
            LogisticParam::A => 4,
            LogisticParam::N => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LogisticParam::K => "k",
            LogisticParam::M => "m",
            LogisticParam::B => "b",
            LogisticParam::Q => "q",
            LogisticParam::A => "a",
            LogisticParam::N => "n",
        }
    }
}

/// Optimizer result for one fit call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    /// Free parameters, in the order the model exposes them.
    pub parameters: Vec<f64>,
    /// Iterations actually run.
    pub iterations: usize,
    /// `false` when the iteration budget ran out first.
    pub converged: bool,
    /// Weighted sum of squared residuals at `parameters`.
    pub sse: f64,
    pub rmse: f64,
    /// Damping factor when the loop stopped.
    pub lambda: f64,
    pub observations: usize,
}

/// Fit outcome for one requested year, as shown to users.
#[derive(Debug, Clone)]
pub struct YearFit {
    pub year: i32,
    pub observations: Vec<WeightedObservation>,
    pub result: Result<FitOutcome, FitError>,
    /// Full logistic parameter vector (fixed + fitted), when the fit succeeded.
    pub full_parameters: Option<Vec<f64>>,
}

/// Exported form of a `YearFit` (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearFitRecord {
    pub year: i32,
    pub n_observations: usize,
    pub free: Vec<LogisticParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<FitOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_parameters: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env`/environment defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Read entries from this file instead of stdin.
    pub input: Option<PathBuf>,
    pub years: Vec<i32>,
    /// Fit every year present in the input (overrides `years`).
    pub all_years: bool,
    pub max_iterations: usize,

    /// Logistic parameters exposed to the optimizer.
    pub free: Vec<LogisticParam>,
    /// Start values for `free` (same length).
    pub start: Vec<f64>,

    pub full: bool,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_json: Option<PathBuf>,
    pub fail_fast: bool,
}

/// Options for synthetic sample generation.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub years: Vec<i32>,
    /// Entries generated per year.
    pub count: usize,
    pub seed: u64,
    /// Gaussian noise standard deviation on tap prevalence.
    pub noise: f64,
    /// Logistic midpoint used to generate the data.
    pub midpoint: f64,
    /// Logistic growth rate used to generate the data.
    pub growth: f64,
    pub hdi_min: f64,
    pub hdi_max: f64,
}
