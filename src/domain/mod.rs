//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input records (`Entry`) and fit inputs (`WeightedObservation`)
//! - logistic parameter names (`LogisticParam`)
//! - fit outputs (`FitOutcome`, `YearFit`, `YearFitRecord`)
//! - run configuration (`FitConfig`, `SampleConfig`)

pub mod types;

pub use types::*;
