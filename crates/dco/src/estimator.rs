use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use creative_core::{PerformancePrediction, PerformanceZone};

/// Maximum absolute jitter applied to the quality projection.
pub const QUALITY_JITTER: f64 = 10.0;
/// Range of the synthetic click-through rate, in percent.
pub const CTR_RANGE: (f64, f64) = (1.0, 5.0);

/// Synthetic performance projection.
///
/// This is a placeholder heuristic, not a statistical model: quality is the
/// compliance score plus bounded uniform noise, and CTR is an independent
/// uniform draw. Nothing here should be read as a real prediction.
#[derive(Debug, Clone)]
pub struct PerformanceEstimator<R = StdRng> {
    rng: R,
}

impl PerformanceEstimator<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic estimator, for tests and reproducible sessions.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for PerformanceEstimator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PerformanceEstimator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Project performance from an analysis score (missing scores count
    /// as 0).
    pub fn estimate(&mut self, score: Option<i64>) -> PerformancePrediction {
        let jitter = self.rng.gen_range(-QUALITY_JITTER..=QUALITY_JITTER);
        let ctr = self.rng.gen_range(CTR_RANGE.0..=CTR_RANGE.1);
        project(score, jitter, ctr)
    }
}

/// Deterministic core of [`PerformanceEstimator::estimate`].
pub fn project(score: Option<i64>, jitter: f64, ctr: f64) -> PerformancePrediction {
    let score = score.unwrap_or(0) as f64;
    let quality = (50.0 + (score - 50.0) + jitter).clamp(0.0, 100.0);
    PerformancePrediction {
        ctr: (ctr * 100.0).round() / 100.0,
        quality,
        zone: PerformanceZone::from_quality(quality),
    }
}
