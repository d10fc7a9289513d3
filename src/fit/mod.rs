//! Curve fitting.
//!
//! Responsibilities:
//!
//! - Levenberg–Marquardt least squares over any `ParametricFunction` (`levenberg`)
//! - per-year fitting of the HDI / tap-water model over a dataset (`session`)

pub mod levenberg;
pub mod session;

pub use levenberg::*;
pub use session::*;
