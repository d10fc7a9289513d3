//! Reduced-parameter view of a parametric function.
//!
//! A `ReducedParametricFunction` pins some parameters of a wrapped function to
//! constants and exposes the rest as its own (shorter) parameter vector. Free
//! slot `i` is written to native position `free_index[i]` before each call.
//!
//! Example: fit only the midpoint `m` and growth rate `b` of the generalized
//! logistic while holding `k, q, a, n` fixed:
//!
//! ```text
//! base       = [1, 0, 1, 1, 0, 1]   (k, m, b, q, a, n)
//! free_index = [1, 2]
//! f([m, b])  = logistic([1, m, b, 1, 0, 1])
//! ```
//!
//! The gradient keeps only the native partials at the free positions. Indices
//! may repeat; writes then go in slot order (last one wins) and each slot still
//! selects its own native partial.

use std::fmt;
use std::sync::Arc;

use crate::error::FitError;
use crate::models::model::{ParametricFunction, check_len};

#[derive(Clone)]
pub struct ReducedParametricFunction {
    wrapped: Arc<dyn ParametricFunction>,
    base: Vec<f64>,
    free_index: Vec<usize>,
}

impl ReducedParametricFunction {
    /// Build a reduced view.
    ///
    /// `base` is copied and must have the wrapped function's native length.
    /// Fails with `FitError::InvalidArgument` if any index is negative or
    /// outside `base`.
    pub fn new(
        wrapped: Arc<dyn ParametricFunction>,
        base: &[f64],
        free_index: &[isize],
    ) -> Result<Self, FitError> {
        if free_index.iter().any(|&i| i < 0) {
            return Err(FitError::InvalidArgument(format!(
                "negative parameter index in {free_index:?}"
            )));
        }
        if base.len() != wrapped.param_count() {
            return Err(FitError::DimensionMismatch {
                expected: wrapped.param_count(),
                found: base.len(),
            });
        }
        let free_index: Vec<usize> = free_index.iter().map(|&i| i as usize).collect();
        if let Some(&bad) = free_index.iter().find(|&&i| i >= base.len()) {
            return Err(FitError::InvalidArgument(format!(
                "parameter index {bad} out of bounds for {} base parameters",
                base.len()
            )));
        }

        Ok(Self {
            wrapped,
            base: base.to_vec(),
            free_index,
        })
    }

    /// Native positions of the free slots.
    pub fn free_index(&self) -> &[usize] {
        &self.free_index
    }

    pub fn base_parameters(&self) -> &[f64] {
        &self.base
    }

    /// Full native parameter vector with the free values written in.
    pub fn expand(&self, free: &[f64]) -> Result<Vec<f64>, FitError> {
        check_len(free, self.free_index.len())?;
        let mut full = self.base.clone();
        for (&idx, &v) in self.free_index.iter().zip(free) {
            full[idx] = v;
        }
        Ok(full)
    }
}

impl ParametricFunction for ReducedParametricFunction {
    fn param_count(&self) -> usize {
        self.free_index.len()
    }

    fn value(&self, x: f64, params: &[f64]) -> Result<f64, FitError> {
        let full = self.expand(params)?;
        self.wrapped.value(x, &full)
    }

    fn gradient(&self, x: f64, params: &[f64]) -> Result<Vec<f64>, FitError> {
        let full = self.expand(params)?;
        let full_gradient = self.wrapped.gradient(x, &full)?;
        check_len(&full_gradient, self.base.len())?;
        Ok(self.free_index.iter().map(|&idx| full_gradient[idx]).collect())
    }
}

impl fmt::Debug for ReducedParametricFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducedParametricFunction")
            .field("base", &self.base)
            .field("free_index", &self.free_index)
            .finish_non_exhaustive()
    }
}
