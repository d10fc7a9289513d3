//! Mapping ingested entries to fit observations.
//!
//! Every entry of the requested year becomes one observation with weight 1,
//! `x = hdi` and `y = tap_prevalence`. Output order is not meaningful: the
//! objective is a sum over observations.

use rayon::prelude::*;

use crate::domain::{Entry, WeightedObservation};

/// Observations for `year` (empty if the year has no entries).
pub fn map_by_year(entries: &[Entry], year: i32) -> Vec<WeightedObservation> {
    entries
        .par_iter()
        .filter(|e| e.year == year)
        .map(|e| WeightedObservation::new(1.0, e.hdi, e.tap_prevalence))
        .collect()
}

/// Distinct years present in `entries`, ascending.
pub fn years(entries: &[Entry]) -> Vec<i32> {
    let mut out: Vec<i32> = entries.iter().map(|e| e.year).collect();
    out.sort_unstable();
    out.dedup();
    out
}
