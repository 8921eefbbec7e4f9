//! Amplitude analysis
//!
//! Builds a histogram of absolute sample values, smooths it by repeated
//! convolution with a small bell-shaped kernel and integrates the
//! low-magnitude end. Quiet, dynamic tracks put much of their mass there;
//! loud, compressed tracks put little, so a small integral means "loud".

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::track::Track;
use crate::preprocessing::silence::nonzero_range;

/// One bin per possible absolute 16-bit value (`0..=32768`)
pub const HISTOGRAM_SIZE: usize = 32769;

/// Bins at the top of the histogram never written by the smoothing pass
const UNSMOOTHED_TAIL: usize = 5;

/// Absolute-value histogram of `samples`
pub fn magnitude_histogram(samples: &[i16]) -> Vec<f64> {
    let mut histogram = vec![0.0f64; HISTOGRAM_SIZE];
    for &s in samples {
        histogram[s.unsigned_abs() as usize] += 1.0;
    }
    histogram
}

/// Progressive smoothing of a magnitude histogram
///
/// Each pass convolves with `[1, 3, 6, 7, 6, 3, 1] / 27` and feeds the
/// interior bins `3..HISTOGRAM_SIZE - 5` back into the next pass. Bins 0-2
/// use narrower kernels and always read the raw low bins; the top five bins
/// of the result stay zero.
pub fn smooth_histogram(histogram: &mut [f64], passes: usize) -> Vec<f64> {
    let size = histogram.len();
    let mut smooth = vec![0.0f64; size];
    if size < 8 {
        return smooth;
    }
    let interior = 3..size - UNSMOOTHED_TAIL;

    for _ in 0..passes {
        let h = &*histogram;
        smooth[0] = h[0];
        smooth[1] = (h[0] + 2.0 * h[1] + h[2]) / 4.0;
        smooth[2] = (h[0] + 2.0 * h[1] + 3.0 * h[2] + 2.0 * h[3] + h[4]) / 9.0;
        for i in interior.clone() {
            smooth[i] = (h[i - 3]
                + 3.0 * h[i - 2]
                + 6.0 * h[i - 1]
                + 7.0 * h[i]
                + 6.0 * h[i + 1]
                + 3.0 * h[i + 2]
                + h[i + 3])
                / 27.0;
        }
        histogram[interior.clone()].copy_from_slice(&smooth[interior.clone()]);
    }
    smooth
}

/// Amplitude rating of a track
///
/// # Arguments
///
/// * `track` - Decoded track; all channels are read interleaved
/// * `config` - Smoothing passes and integral bound
///
/// # Returns
///
/// `-0.2 * integral + 6`, where the integral covers the smoothed histogram
/// from 0 to `amplitude_integral_sup`, scaled to percent of the non-silent
/// length
///
/// # Errors
///
/// `DegenerateInput` if the track is silent or its non-silent range has
/// zero length; `NumericalError` if the rating is not finite.
pub fn amplitude_rating(track: &Track, config: &AnalysisConfig) -> Result<f32, AnalysisError> {
    let samples = track.samples();
    let range = nonzero_range(samples)
        .ok_or_else(|| AnalysisError::DegenerateInput("track is entirely silent".to_string()))?;
    if range.span() == 0 {
        return Err(AnalysisError::DegenerateInput(
            "non-silent range has zero length".to_string(),
        ));
    }

    let mut histogram = magnitude_histogram(&samples[range.start..=range.end]);
    let smooth = smooth_histogram(&mut histogram, config.amplitude_passes);

    let scale = 100.0 / range.span() as f64;
    let sup = config.amplitude_integral_sup.min(HISTOGRAM_SIZE - 1);
    let integral: f64 = smooth[..=sup].iter().map(|v| (v * scale).abs()).sum();

    let rating = (-0.2 * integral + 6.0) as f32;
    log::debug!(
        "Amplitude: range [{}, {}], integral={:.4}, rating={:.4}",
        range.start,
        range.end,
        integral,
        rating
    );
    AnalysisError::ensure_finite("amplitude", rating)
}
