//! Damped normal equations for Gauss-Newton / Levenberg-Marquardt steps.
//!
//! Given a (weighted) Jacobian `J` and residual vector `r`, each optimizer
//! iteration solves:
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) Δ = -Jᵀr
//! ```
//!
//! Implementation choices:
//! - The parameter dimension is tiny (2–6), so we form `JᵀJ` explicitly.
//! - Cholesky first (the damped matrix is symmetric and, for `λ > 0`, positive
//!   definite in exact arithmetic), LU as a fallback for borderline cases.
//! - Diagonal entries of `JᵀJ` are floored at `DIAG_FLOOR` before scaling by
//!   `λ`, otherwise a parameter with an all-zero Jacobian column would never
//!   receive any damping and the system would stay singular.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Minimum diagonal scale used for damping.
const DIAG_FLOOR: f64 = 1e-12;

/// Form `JᵀJ` and `Jᵀr`.
pub fn normal_equations(jacobian: &DMatrix<f64>, residuals: &DVector<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let jt = jacobian.transpose();
    (&jt * jacobian, &jt * residuals)
}

/// Solve the damped system for the step `Δ`.
///
/// Fails with `SingularSystem` if the system is singular or the solution is not finite.
pub fn solve_damped(jtj: &DMatrix<f64>, jtr: &DVector<f64>, lambda: f64) -> Result<DVector<f64>, FitError> {
    let mut a = jtj.clone();
    for i in 0..a.nrows() {
        let d = jtj[(i, i)].max(DIAG_FLOOR);
        a[(i, i)] += lambda * d;
    }
    let rhs = -jtr;

    if let Some(chol) = a.clone().cholesky() {
        let step = chol.solve(&rhs);
        if step.iter().all(|v| v.is_finite()) {
            return Ok(step);
        }
    }

    match a.lu().solve(&rhs) {
        Some(step) if step.iter().all(|v| v.is_finite()) => Ok(step),
        _ => Err(FitError::SingularSystem),
    }
}
