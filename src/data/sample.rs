//! Synthetic HDI / tap-water samples drawn from a logistic curve.
//!
//! For each year we draw `count` HDI values uniformly from `[hdi_min, hdi_max]`
//! and set
//!
//! ```text
//! tap = clamp(1 / (1 + exp(growth * (midpoint - hdi))) + N(0, noise²), 0, 1)
//! ```
//!
//! Output is deterministic for a given config (seeded `StdRng` per year).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Entry, SampleConfig};
use crate::error::AppError;
use crate::fit::session::DEFAULT_BASE_PARAMETERS;
use crate::models::{GeneralizedLogistic, ParametricFunction};

pub fn generate_sample(config: &SampleConfig) -> Result<Vec<Entry>, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    if config.years.is_empty() {
        return Err(AppError::new(2, "At least one sample year is required."));
    }
    if !(config.hdi_min.is_finite() && config.hdi_max.is_finite() && config.hdi_max > config.hdi_min) {
        return Err(AppError::new(2, "Invalid HDI range for sample generation."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Noise must be finite and >= 0."));
    }

    let mut params = DEFAULT_BASE_PARAMETERS;
    params[1] = config.midpoint;
    params[2] = config.growth;

    let noise = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut out = Vec::with_capacity(config.count * config.years.len());
    for &year in &config.years {
        let mut rng = StdRng::seed_from_u64(sample_seed(config, year));
        for _ in 0..config.count {
            let hdi = rng.gen_range(config.hdi_min..=config.hdi_max);
            let level = GeneralizedLogistic.value(hdi, &params)?;
            let tap = (level + noise.sample(&mut rng)).clamp(0.0, 1.0);
            out.push(Entry::new(year, hdi, tap));
        }
    }
    Ok(out)
}

fn sample_seed(config: &SampleConfig, year: i32) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    year.hash(&mut hasher);
    config.count.hash(&mut hasher);
    config.midpoint.to_bits().hash(&mut hasher);
    config.growth.to_bits().hash(&mut hasher);
    hasher.finish()
}
