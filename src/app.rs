//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up logging; this module is the "real main" that:
//! - parses CLI arguments
//! - reads `year;hdi;tap` input
//! - fits each requested year
//! - prints year lines, diagnostics and plots
//! - writes the optional JSON export

use clap::Parser;
use tracing::info;

use crate::cli::{Command, FitArgs, SampleArgs};
use crate::domain::{FitConfig, SampleConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `taphdi` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` only supplies defaults for the `TAPHDI_*` variables.
    dotenvy::dotenv().ok();

    // Clap requires a subcommand name, so `taphdi` and `taphdi --year 2000`
    // are rewritten to `taphdi fit ...` before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    if config.full {
        println!("{}", crate::report::format_run_summary(&run.ingest, &run.years, &config));
    }

    let function = if config.full || config.plot {
        Some(pipeline::reduced_logistic(&config.free)?)
    } else {
        None
    };

    for fit in &run.fits {
        println!("{}", crate::report::format_year_line(fit));

        if let (Some(function), Ok(outcome)) = (&function, &fit.result) {
            let residuals =
                crate::report::compute_residuals(function, &outcome.parameters, &fit.observations)?;
            if config.full {
                print!("{}", crate::report::format_year_details(fit, &residuals));
            }
            if config.plot {
                let plot = crate::plot::render_ascii_plot(
                    &residuals,
                    function,
                    &outcome.parameters,
                    config.plot_width,
                    config.plot_height,
                )?;
                println!("{plot}");
            }
        }

        if config.fail_fast {
            if let Err(err) = &fit.result {
                return Err(AppError::new(err.exit_code(), format!("{}: {err}", fit.year)));
            }
        }
    }

    if let Some(path) = &config.export_json {
        crate::io::export::write_results_json(path, &run.fits, &config.free)?;
        info!(path = %path.display(), "wrote results JSON");
    }

    match run.first_failure() {
        Some((year, err)) => Err(AppError::new(err.exit_code(), format!("{year}: {err}"))),
        None => Ok(()),
    }
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(&args);
    let entries = crate::data::generate_sample(&config)?;
    for entry in &entries {
        println!("{entry}");
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        input: args.input.clone(),
        years: args.years.clone(),
        all_years: args.all_years,
        max_iterations: args.max_iter,
        free: args.free.clone(),
        start: args.start.clone(),
        full: args.full,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_json: args.export_json.clone(),
        fail_fast: args.fail_fast,
    }
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        years: args.years.clone(),
        count: args.count,
        seed: args.seed,
        noise: args.noise,
        midpoint: args.midpoint,
        growth: args.growth,
        hdi_min: args.hdi_min,
        hdi_max: args.hdi_max,
    }
}

/// Rewrite argv so `taphdi` defaults to `taphdi fit`.
///
/// Rules:
/// - `taphdi`                       -> `taphdi fit`
/// - `taphdi --year 2000 ...`       -> `taphdi fit --year 2000 ...`
/// - `taphdi --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "sample");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    argv
}
