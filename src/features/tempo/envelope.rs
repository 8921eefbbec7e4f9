//! Per-band activity curves
//!
//! Turns a coarse band envelope into an activity curve: log-compansion with
//! zero-stuffing to twice the rate, Butterworth smoothing, a half-wave
//! rectified first difference (onsets), and a weighted mix of the smoothed
//! and onset curves.

use crate::error::AnalysisError;
use crate::features::tempo::lowpass::ButterworthLowpass;

/// Envelope post-processing parameters
#[derive(Debug, Clone, Copy)]
pub struct ActivityParams {
    /// Compansion constant μ
    pub mu: f64,
    /// Onset weight λ
    pub lambda: f64,
    /// Low-pass cutoff in Hz
    pub cutoff_hz: f64,
    /// Rate of the upsampled curve in Hz
    pub curve_rate: f64,
}

/// Upsample by two: `ln(1 + μx) / ln(1 + μ)` on even samples, zeros between
pub fn compand_upsample(envelope: &[f64], mu: f64) -> Vec<f64> {
    let norm = (1.0 + mu).ln();
    envelope
        .iter()
        .flat_map(|&x| [(1.0 + mu * x).ln() / norm, 0.0])
        .collect()
}

/// Half-wave rectified first difference; the first sample differences
/// against zero
pub fn rectified_difference(curve: &[f64]) -> Vec<f64> {
    let mut previous = 0.0;
    curve
        .iter()
        .map(|&x| {
            let d = (x - previous).max(0.0);
            previous = x;
            d
        })
        .collect()
}

/// Activity curve of one band
///
/// # Arguments
///
/// * `envelope` - Coarse band envelope, one sample per half window
/// * `params` - Compansion, onset weight and low-pass settings
///
/// # Returns
///
/// `(1 - λ)·smoothed + λ·(curve_rate / cutoff)·onsets`, twice as long as
/// `envelope`
///
/// # Errors
///
/// `InvalidInput` if the low-pass cannot be designed at `curve_rate`.
pub fn band_activity(envelope: &[f64], params: &ActivityParams) -> Result<Vec<f64>, AnalysisError> {
    let upsampled = compand_upsample(envelope, params.mu);
    let mut lowpass = ButterworthLowpass::new(params.cutoff_hz, params.curve_rate)?;
    let smoothed = lowpass.process_all(&upsampled);
    let onsets = rectified_difference(&smoothed);

    let onset_scale = params.lambda * params.curve_rate / params.cutoff_hz;
    Ok(smoothed
        .iter()
        .zip(&onsets)
        .map(|(&s, &d)| (1.0 - params.lambda) * s + onset_scale * d)
        .collect())
}
