//! Parametric model implementations.
//!
//! Models are small, pure values behind the `ParametricFunction` trait so that
//! the fitter can stay generic.

pub mod logistic;
pub mod model;
pub mod reduced;

pub use logistic::*;
pub use model::*;
pub use reduced::*;
