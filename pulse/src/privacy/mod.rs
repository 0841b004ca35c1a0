//! Privacy filter: small-bucket suppression and Laplace perturbation.
//!
//! Suppression runs first and looks at the pre-noise count, so no emitted
//! record ever describes fewer than `minimum_bucket_size` roles. Survivors get
//! independent zero-mean Laplace noise on `role_count_day` and
//! `median_rate_day_usd`; the percentage columns stay as aggregated.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::PulseRecord;
use crate::transform::rounding::round_rate;

/// Source of zero-mean Laplace samples.
pub trait NoiseSource {
    /// One sample with scale `b`. `b <= 0` must return `0.0`.
    fn laplace(&mut self, scale: f64) -> f64;
}

/// Inverse-CDF Laplace sampler over any `rand` generator.
#[derive(Debug, Clone)]
pub struct LaplaceNoise<R> {
    rng: R,
}

impl<R: Rng> LaplaceNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl LaplaceNoise<StdRng> {
    /// Reproducible noise: the same seed gives the same sample sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Seeded when `seed` is set, OS entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> NoiseSource for LaplaceNoise<R> {
    fn laplace(&mut self, scale: f64) -> f64 {
        if scale <= 0.0 {
            return 0.0;
        }
        // u in [-0.5, 0.5); the -0.5 endpoint would give ln(0)
        let mut u: f64 = self.rng.gen::<f64>() - 0.5;
        while u == -0.5 {
            u = self.rng.gen::<f64>() - 0.5;
        }
        -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
    }
}

/// Noise source that always returns the same offset (zero by default).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn laplace(&mut self, scale: f64) -> f64 {
        if scale <= 0.0 {
            0.0
        } else {
            self.0
        }
    }
}

/// Split records into those meeting the minimum population and the count
/// of those that do not.
pub fn suppress(
    records: Vec<PulseRecord>,
    minimum_bucket_size: usize,
) -> (Vec<PulseRecord>, usize) {
    let before = records.len();
    let kept: Vec<PulseRecord> = records
        .into_iter()
        .filter(|r| r.role_count_day >= minimum_bucket_size as u64)
        .collect();
    let suppressed = before - kept.len();
    (kept, suppressed)
}

/// Add noise to the count and median rate of one surviving record.
///
/// Count is rounded to an integer and clamped at zero; the rate is snapped
/// back to the $25 grid and clamped at zero. A null rate stays null.
pub fn perturb(record: &PulseRecord, scale: f64, noise: &mut dyn NoiseSource) -> PulseRecord {
    let count = record.role_count_day as f64 + noise.laplace(scale);
    let role_count_day = count.round().max(0.0) as u64;

    let median_rate_day_usd = record
        .median_rate_day_usd
        .map(|rate| round_rate(rate as f64 + noise.laplace(scale)).max(0));

    PulseRecord {
        role_count_day,
        median_rate_day_usd,
        ..record.clone()
    }
}
