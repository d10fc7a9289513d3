//! `tap-hdi` library crate.
//!
//! Fits a generalized logistic curve of tap-water prevalence against HDI, one
//! fit per year. The binary (`taphdi`) is a thin wrapper around this library so
//! that:
//!
//! - core logic is testable without spawning processes
//! - the model/fitter pieces (`models`, `fit`) are reusable on their own

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
