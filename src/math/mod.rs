//! Linear algebra helpers for the least-squares fitter.

pub mod normal;

pub use normal::*;
