//! Zero-mean, unit-variance normalization

use crate::error::AnalysisError;

/// Streaming mean and variance (Welford's algorithm)
///
/// Numerically stable over tens of millions of samples, unlike the naive
/// sum-of-squares formula.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of the observations (0 when empty)
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (0 when fewer than two observations)
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Shift and scale `samples` in place to zero mean and unit variance
///
/// # Errors
///
/// `DegenerateInput` if the signal is constant (including empty).
pub fn standardize(samples: &mut [f32]) -> Result<RunningStats, AnalysisError> {
    let mut stats = RunningStats::new();
    for &s in samples.iter() {
        stats.push(s as f64);
    }

    let std_dev = stats.std_dev();
    if !(std_dev > 0.0) {
        return Err(AnalysisError::DegenerateInput(format!(
            "constant signal over {} samples",
            stats.count()
        )));
    }

    log::debug!("Standardizing: mean={:.3}, std={:.3}", stats.mean(), std_dev);

    let mean = stats.mean();
    let inv_std = 1.0 / std_dev;
    for s in samples.iter_mut() {
        *s = ((*s as f64 - mean) * inv_std) as f32;
    }
    Ok(stats)
}
