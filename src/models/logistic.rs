//! Generalized logistic (Richards) curve.
//!
//! ```text
//! f(x) = a + (k - a) / (1 + q * exp(b * (m - x)))^(1/n)
//! ```
//!
//! Parameter order is `[k, m, b, q, a, n]`:
//! - `k`: upper asymptote
//! - `m`: midpoint
//! - `b`: growth rate
//! - `q`: midpoint scaling
//! - `a`: lower asymptote
//! - `n`: shape exponent, must be strictly positive
//!
//! With `k=1, q=1, a=0, n=1` this is the plain sigmoid `1 / (1 + exp(b(m - x)))`.

use crate::error::FitError;
use crate::models::model::{ParametricFunction, check_len};

/// Number of native parameters.
pub const LOGISTIC_PARAMS: usize = 6;

/// The 6-parameter generalized logistic function.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedLogistic;

impl GeneralizedLogistic {
    fn validate(params: &[f64]) -> Result<(), FitError> {
        check_len(params, LOGISTIC_PARAMS)?;
        let n = params[5];
        if n <= 0.0 || n.is_nan() {
            return Err(FitError::InvalidArgument(format!(
                "logistic shape exponent n must be > 0, got {n}"
            )));
        }
        Ok(())
    }
}

impl ParametricFunction for GeneralizedLogistic {
    fn param_count(&self) -> usize {
        LOGISTIC_PARAMS
    }

    fn value(&self, x: f64, params: &[f64]) -> Result<f64, FitError> {
        Self::validate(params)?;
        let (k, m, b, q, a, n) = (params[0], params[1], params[2], params[3], params[4], params[5]);
        let s = 1.0 + q * (b * (m - x)).exp();
        Ok(a + (k - a) / s.powf(1.0 / n))
    }

    fn gradient(&self, x: f64, params: &[f64]) -> Result<Vec<f64>, FitError> {
        Self::validate(params)?;
        let (k, m, b, q, a, n) = (params[0], params[1], params[2], params[3], params[4], params[5]);

        let m_minus_x = m - x;
        let inv_n = 1.0 / n;
        let e = (b * m_minus_x).exp();
        let qe = q * e;
        let s = 1.0 + qe;
        let inv_p = 1.0 / s.powf(inv_n);

        // d/ds of (k - a) * s^(-1/n)
        let factor1 = (k - a) * inv_n * inv_p;
        let factor2 = -factor1 / s;

        Ok(vec![
            inv_p,
            factor2 * b * qe,
            factor2 * m_minus_x * qe,
            factor2 * e,
            1.0 - inv_p,
            factor1 * s.ln() * inv_n,
        ])
    }
}
