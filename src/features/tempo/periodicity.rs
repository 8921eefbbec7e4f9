//! Periodicity of the aggregate band-activity curve
//!
//! The magnitude spectrum of the activity curve shows a peak at every
//! recurring rhythm frequency. Up to three well-separated peaks between
//! `min_hz` and `max_hz` are kept and mapped to a tempo rating.

use crate::error::AnalysisError;
use crate::features::tempo::peak_picking::find_peaks;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

/// Maximum number of tempo peaks kept
pub const MAX_PEAKS: usize = 3;

/// Peaks weaker than this fraction of the spectrum maximum are rounding noise
const NOISE_FLOOR: f64 = 1e-6;

/// One periodicity peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoPeak {
    /// Frequency of the peak in Hz
    pub frequency_hz: f64,
    /// Spectral magnitude of the peak
    pub magnitude: f64,
    /// Tempo rating derived from this peak alone
    pub rating: f32,
}

/// Search parameters for [`spectral_peaks`]
#[derive(Debug, Clone, Copy)]
pub struct PeriodicityParams {
    /// Sample rate of the activity curve in Hz
    pub curve_rate: f64,
    /// Lowest frequency considered
    pub min_hz: f64,
    /// Highest frequency considered
    pub max_hz: f64,
    /// Minimum distance between kept peaks in Hz
    pub separation_hz: f64,
}

/// Linear calibration from a periodicity frequency to a tempo rating
pub fn peak_rating(frequency_hz: f64) -> f32 {
    (-4.1026 / frequency_hz + 4.2052) as f32
}

/// Magnitude spectrum of `curve`, bins `0..=len/2`
pub fn magnitude_spectrum(curve: &[f64]) -> Vec<f64> {
    let mut buffer: Vec<Complex<f64>> = curve.iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer[..=curve.len() / 2].iter().map(|x| x.norm()).collect()
}

/// Strongest periodicity peaks of `curve`, strongest first
///
/// # Arguments
///
/// * `curve` - Aggregate activity curve
/// * `params` - Curve rate, search band and peak separation
///
/// # Returns
///
/// Up to [`MAX_PEAKS`] peaks with their frequency, magnitude and rating
///
/// # Errors
///
/// `DegenerateInput` if the curve is too short to resolve the search band
/// or has no peak inside it.
pub fn spectral_peaks(
    curve: &[f64],
    params: &PeriodicityParams,
) -> Result<Vec<TempoPeak>, AnalysisError> {
    if curve.len() < 4 {
        return Err(AnalysisError::DegenerateInput(format!(
            "activity curve of {} samples",
            curve.len()
        )));
    }

    let spectrum = magnitude_spectrum(curve);
    let df = params.curve_rate / curve.len() as f64;
    let first = (params.min_hz / df).floor() as usize;
    let last = (params.max_hz / df).floor() as usize;
    let separation = ((params.separation_hz / df).ceil() as usize).max(1);

    log::debug!(
        "Periodicity: {} curve samples at {:.3} Hz, df={:.5} Hz, bins [{}, {}], separation {}",
        curve.len(),
        params.curve_rate,
        df,
        first,
        last,
        separation
    );

    let ceiling = spectrum[1..].iter().copied().fold(0.0f64, f64::max);
    let threshold = ceiling * NOISE_FLOOR;

    let peaks: Vec<TempoPeak> = find_peaks(&spectrum, first..=last, threshold, separation, MAX_PEAKS)
        .into_iter()
        .map(|(bin, magnitude)| {
            let frequency_hz = bin as f64 * df;
            TempoPeak {
                frequency_hz,
                magnitude,
                rating: peak_rating(frequency_hz),
            }
        })
        .collect();

    if peaks.is_empty() {
        return Err(AnalysisError::DegenerateInput(format!(
            "no periodicity peak between {} and {} Hz",
            params.min_hz, params.max_hz
        )));
    }
    Ok(peaks)
}

/// Combine peak ratings, weighting each by `sqrt(magnitude / strongest)`
pub fn combined_rating(peaks: &[TempoPeak]) -> Option<f32> {
    let strongest = peaks.first()?.magnitude;
    if !(strongest > 0.0) {
        return None;
    }
    let (weighted, total) = peaks.iter().fold((0.0f64, 0.0f64), |(sum, total), peak| {
        let weight = (peak.magnitude / strongest).sqrt();
        (sum + weight * peak.rating as f64, total + weight)
    });
    Some((weighted / total) as f32)
}
