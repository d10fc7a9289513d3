//! Error types.
//!
//! - `FitError`: typed failures of the fitting core (models, fitter, session).
//! - `AppError`: what the binary reports; carries the process exit code.
//!
//! Exit codes:
//! - 2: bad input or configuration
//! - 3: not enough data to fit
//! - 4: numerical failure

use thiserror::Error;

/// Failures raised by the model adapters and the least-squares fitter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Malformed constructor or option input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A parameter vector has the wrong length.
    #[error("dimension mismatch: expected {expected} parameters, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Fitting was requested against an empty observation set.
    #[error("no observations to fit")]
    InsufficientData,

    /// The damped normal equations could not be solved.
    #[error("normal equations are singular")]
    SingularSystem,

    /// The optimizer gave up.
    #[error("fit did not converge: {0}")]
    NonConvergent(String),
}

impl FitError {
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::InvalidArgument(_) | FitError::DimensionMismatch { .. } => 2,
            FitError::InsufficientData => 3,
            FitError::SingularSystem | FitError::NonConvergent(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_map_to_exit_codes() {
        let app: AppError = FitError::InsufficientData.into();
        assert_eq!(app.exit_code(), 3);
        assert_eq!(app.to_string(), "no observations to fit");

        let app: AppError = FitError::DimensionMismatch { expected: 2, found: 3 }.into();
        assert_eq!(app.exit_code(), 2);

        let app: AppError = FitError::NonConvergent("lambda overflow".to_string()).into();
        assert_eq!(app.exit_code(), 4);
    }
}
