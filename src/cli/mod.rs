//! Command-line parsing for the HDI / tap-water logistic fitter.
//!
//! Argument parsing and command dispatch stay separate from the fitting code;
//! `app.rs` turns these args into a `FitConfig` / `SampleConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::LogisticParam;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "taphdi",
    version,
    about = "Fit tap-water prevalence against HDI with a generalized logistic curve"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read `year;hdi;tap` lines and fit one curve per year (default command).
    Fit(FitArgs),
    /// Write synthetic `year;hdi;tap` lines drawn from a logistic curve.
    Sample(SampleArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Years to fit (repeatable or comma-separated).
    #[arg(
        short = 'y',
        long = "year",
        env = "TAPHDI_YEARS",
        value_delimiter = ',',
        default_values_t = [1990, 2015]
    )]
    pub years: Vec<i32>,

    /// Fit every year present in the input instead of `--year`.
    #[arg(long)]
    pub all_years: bool,

    /// Maximum Levenberg-Marquardt iterations per year.
    #[arg(long = "max-iter", env = "TAPHDI_MAX_ITER", default_value_t = 10_000)]
    pub max_iter: usize,

    /// Read input from a file instead of stdin.
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Logistic parameters to fit, the rest stay at the unit curve values.
    #[arg(long, value_enum, value_delimiter = ',', default_values = ["m", "b"])]
    pub free: Vec<LogisticParam>,

    /// Start values for the free parameters, same order as `--free`.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.5, 20.0])]
    pub start: Vec<f64>,

    /// Print the expanded parameter vector, diagnostics and residuals.
    #[arg(long)]
    pub full: bool,

    /// Render an ASCII plot of each year's fit.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,

    /// Export per-year results to JSON.
    #[arg(long = "export-json", value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Stop at the first year whose fit fails.
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Years to generate (repeatable or comma-separated).
    #[arg(short = 'y', long = "year", value_delimiter = ',', default_values_t = [1990, 2015])]
    pub years: Vec<i32>,

    /// Entries per year.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Standard deviation of the Gaussian noise added to tap prevalence.
    #[arg(long, default_value_t = 0.03)]
    pub noise: f64,

    /// Logistic midpoint (HDI at 50% tap prevalence).
    #[arg(long = "m", default_value_t = 0.6)]
    pub midpoint: f64,

    /// Logistic growth rate.
    #[arg(long = "b", default_value_t = 12.0, allow_hyphen_values = true)]
    pub growth: f64,

    /// Lowest HDI drawn.
    #[arg(long, default_value_t = 0.3)]
    pub hdi_min: f64,

    /// Highest HDI drawn.
    #[arg(long, default_value_t = 0.95)]
    pub hdi_max: f64,
}
