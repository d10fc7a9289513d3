//! Export per-year fit results to JSON.
//!
//! The export is meant to be easy to consume in notebooks or downstream scripts:
//! one record per requested year, with either an outcome or an error message.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{LogisticParam, YearFit, YearFitRecord};
use crate::error::AppError;

/// Convert in-memory fits to their exported form.
pub fn to_records(fits: &[YearFit], free: &[LogisticParam]) -> Vec<YearFitRecord> {
    fits.iter()
        .map(|fit| YearFitRecord {
            year: fit.year,
            n_observations: fit.observations.len(),
            free: free.to_vec(),
            outcome: fit.result.as_ref().ok().cloned(),
            full_parameters: fit.full_parameters.clone(),
            error: fit.result.as_ref().err().map(|e| e.to_string()),
        })
        .collect()
}

/// Write records as pretty JSON to any writer.
pub fn write_records<W: Write>(writer: W, records: &[YearFitRecord]) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, records)
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))
}

/// Write per-year results to a JSON file.
pub fn write_results_json(path: &Path, fits: &[YearFit], free: &[LogisticParam]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;
    write_records(file, &to_records(fits, free))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitOutcome, WeightedObservation};
    use crate::error::FitError;

    #[test]
    fn exports_outcomes_and_errors() {
        let fits = vec![
            YearFit {
                year: 1990,
                observations: vec![WeightedObservation::new(1.0, 0.5, 0.8)],
                result: Ok(FitOutcome {
                    parameters: vec![0.5, 20.0],
                    iterations: 3,
                    converged: true,
                    sse: 0.0,
                    rmse: 0.0,
                    lambda: 1e-6,
                    observations: 1,
                }),
                full_parameters: Some(vec![1.0, 0.5, 20.0, 1.0, 0.0, 1.0]),
            },
            YearFit {
                year: 2000,
                observations: Vec::new(),
                result: Err(FitError::InsufficientData),
                full_parameters: None,
            },
        ];

        let mut buf = Vec::new();
        write_records(&mut buf, &to_records(&fits, &[LogisticParam::M, LogisticParam::B])).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value[0]["year"], 1990);
        assert_eq!(value[0]["free"], serde_json::json!(["m", "b"]));
        assert_eq!(value[0]["outcome"]["parameters"], serde_json::json!([0.5, 20.0]));
        assert!(value[0].get("error").is_none());
        assert_eq!(value[1]["error"], "no observations to fit");
        assert!(value[1].get("outcome").is_none());
    }
}
