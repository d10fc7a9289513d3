//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (the year lines are what scripts parse)

use crate::domain::{FitConfig, LogisticParam, YearFit};
use crate::io::ingest::IngestedEntries;
use crate::report::Residual;

/// `"<year>: [v1, v2, ...]"`, or `"<year>: error: <message>"` for a failed fit.
pub fn format_year_line(fit: &YearFit) -> String {
    match &fit.result {
        Ok(outcome) => format!("{}: {}", fit.year, fmt_params(&outcome.parameters)),
        Err(err) => format!("{}: error: {err}", fit.year),
    }
}

/// Bracketed, comma-separated list using shortest round-trip float formatting.
pub fn fmt_params(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:?}")).collect();
    format!("[{}]", parts.join(", "))
}

/// Ingest summary (counts and dropped lines).
pub fn format_run_summary(ingest: &IngestedEntries, years: &[i32], config: &FitConfig) -> String {
    let mut out = String::new();
    out.push_str("=== taphdi - generalized logistic fit (HDI vs tap water) ===\n");
    out.push_str(&format!(
        "Input: {}\n",
        config
            .input
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string())
    ));
    out.push_str(&format!(
        "Rows: read={} used={} dropped={}\n",
        ingest.rows_read,
        ingest.entries.len(),
        ingest.row_errors.len()
    ));
    let names: Vec<&str> = config.free.iter().map(|p| p.name()).collect();
    out.push_str(&format!(
        "Free: {} | start={} | max_iter={}\n",
        names.join(","),
        fmt_params(&config.start),
        config.max_iterations
    ));
    let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    out.push_str(&format!("Years: {}\n", years.join(", ")));
    out
}

/// Diagnostics block for one year (shown with `--full`).
pub fn format_year_details(fit: &YearFit, residuals: &[Residual]) -> String {
    let mut out = String::new();
    let Ok(outcome) = &fit.result else {
        return out;
    };

    if let Some(full) = &fit.full_parameters {
        let named: Vec<String> = LogisticParam::ALL
            .iter()
            .zip(full.iter())
            .map(|(p, v)| format!("{}={v:.6}", p.name()))
            .collect();
        out.push_str(&format!("  logistic: {}\n", named.join(" ")));
    }
    out.push_str(&format!(
        "  n={} iterations={} converged={} SSE={:.6e} RMSE={:.6} lambda={:.3e}\n",
        outcome.observations, outcome.iterations, outcome.converged, outcome.sse, outcome.rmse, outcome.lambda
    ));

    if !residuals.is_empty() {
        out.push_str(&format!("  {:>8} {:>10} {:>10} {:>10}\n", "hdi", "tap_obs", "tap_fit", "residual"));
        out.push_str(&format!("  {:->8} {:->10} {:->10} {:->10}\n", "", "", "", ""));
        for r in residuals {
            out.push_str(&format!(
                "  {:>8.3} {:>10.4} {:>10.4} {:>10.4}\n",
                r.x, r.y_obs, r.y_fit, r.residual
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitOutcome;
    use crate::error::FitError;

    fn outcome(parameters: Vec<f64>) -> FitOutcome {
        FitOutcome {
            parameters,
            iterations: 7,
            converged: true,
            sse: 1e-3,
            rmse: 0.01,
            lambda: 1e-5,
            observations: 10,
        }
    }

    #[test]
    fn year_line_matches_bracketed_list() {
        let fit = YearFit {
            year: 1990,
            observations: Vec::new(),
            result: Ok(outcome(vec![0.5, 20.0])),
            full_parameters: None,
        };
        assert_eq!(format_year_line(&fit), "1990: [0.5, 20.0]");
    }

    #[test]
    fn failed_year_line_names_the_error() {
        let fit = YearFit {
            year: 2015,
            observations: Vec::new(),
            result: Err(FitError::InsufficientData),
            full_parameters: None,
        };
        assert_eq!(format_year_line(&fit), "2015: error: no observations to fit");
    }

    #[test]
    fn fmt_params_keeps_full_precision() {
        assert_eq!(fmt_params(&[0.1234567891234, -3.0]), "[0.1234567891234, -3.0]");
        assert_eq!(fmt_params(&[]), "[]");
    }

    #[test]
    fn details_list_named_logistic_parameters() {
        let fit = YearFit {
            year: 1990,
            observations: Vec::new(),
            result: Ok(outcome(vec![0.6, 12.0])),
            full_parameters: Some(vec![1.0, 0.6, 12.0, 1.0, 0.0, 1.0]),
        };
        let txt = format_year_details(&fit, &[]);
        assert!(txt.contains("k=1.000000 m=0.600000 b=12.000000"), "{txt}");
        assert!(txt.contains("iterations=7 converged=true"), "{txt}");
    }
}
