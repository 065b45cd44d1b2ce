//! Synthetic cohort generation.
//!
//! Each student gets a score per role drawn from a normal distribution around a
//! common mean, then one role (picked uniformly) receives a random boost so most
//! students have a clear favourite while a few land close enough to a tie to be
//! integrators. Output is fully determined by the seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Role, RoleScores, ScoreRecord};
use crate::error::AppError;

/// Upper bound of the questionnaire score scale.
pub const MAX_SCORE: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    pub count: usize,
    pub seed: u64,
    /// Mean of the base score distribution.
    pub mean: f64,
    /// Standard deviation of the base score distribution.
    pub std_dev: f64,
    /// Largest boost given to a student's favourite role.
    pub max_boost: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: 24,
            seed: 42,
            mean: 9.0,
            std_dev: 2.5,
            max_boost: 8.0,
        }
    }
}

/// Generate `config.count` score records.
pub fn generate_cohort(config: &SampleConfig) -> Result<Vec<ScoreRecord>, AppError> {
    if config.count == 0 {
        return Err(AppError::usage("Sample count must be > 0."));
    }
    if !(config.max_boost.is_finite() && config.max_boost >= 0.0) {
        return Err(AppError::usage("Invalid boost setting (must be finite and >= 0)."));
    }
    let normal = Normal::new(config.mean, config.std_dev)
        .map_err(|e| AppError::usage(format!("Invalid score distribution: {e}")))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut out = Vec::with_capacity(config.count);

    for n in 1..=config.count {
        let mut scores = Role::ALL.map(|_| normal.sample(&mut rng));
        let favourite = rng.gen_range(0..Role::ALL.len());
        scores[favourite] += rng.gen_range(0.0..=config.max_boost);

        let [clarifier, ideator, developer, implementer] = scores.map(clamp_score);
        out.push(ScoreRecord::new(
            format!("Student-{n:03}"),
            RoleScores::new(clarifier, ideator, developer, implementer),
        ));
    }

    Ok(out)
}

/// Clamp to the score scale and round to one decimal.
fn clamp_score(v: f64) -> f64 {
    (v.clamp(0.0, MAX_SCORE) * 10.0).round() / 10.0
}
