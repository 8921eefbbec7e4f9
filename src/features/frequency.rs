//! Frequency balance analysis
//!
//! Averages Hann-windowed power spectra over the whole track and compares
//! the level of the upper bands against the two lowest ones. Bright,
//! treble-heavy tracks score high; bass-heavy, muffled tracks score low.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::window::hann;
use crate::io::track::Track;
use crate::preprocessing::channel_mixer::downmix_to_mono;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::ops::RangeInclusive;

/// Smallest window whose half-spectrum covers every band
pub const MIN_WINDOW: usize = 236;

/// Band boundaries as inclusive bin ranges
const LOW: RangeInclusive<usize> = 1..=2;
const LOW_MID: RangeInclusive<usize> = 3..=4;
const MID: RangeInclusive<usize> = 5..=30;
const MID_HIGH: RangeInclusive<usize> = 31..=59;
const HIGH: RangeInclusive<usize> = 60..=117;

/// Mean level in dB of the five bands, lowest first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLevels {
    /// Bins 1-2
    pub low: f32,
    /// Bins 3-4
    pub low_mid: f32,
    /// Bins 5-30
    pub mid: f32,
    /// Bins 31-59
    pub mid_high: f32,
    /// Bins 60-117
    pub high: f32,
}

impl BandLevels {
    /// Spectral-tilt score
    pub fn rating(&self) -> f32 {
        let sum = self.high + self.mid_high + self.mid - self.low - self.low_mid;
        sum / 3.0 + 68.0 / 3.0
    }
}

/// Accumulated power spectrum over bins `0..=window/2`
///
/// Frames are non-overlapping and multi-channel audio is averaged per frame
/// first.
///
/// # Arguments
///
/// * `samples` - Interleaved samples
/// * `channels` - Channel count of `samples`
/// * `window` - FFT length; a trailing partial frame is ignored
///
/// # Returns
///
/// The summed power per bin and the number of frames summed
pub fn power_spectrum(samples: &[i16], channels: usize, window: usize) -> (Vec<f32>, usize) {
    let mono = downmix_to_mono(samples, channels);
    let n_frames = mono.len() / window;
    let half = window / 2;

    let hann = hann(window);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(window);

    let mut spectrum = vec![0.0f32; half + 1];
    let mut buffer = vec![Complex::new(0.0f32, 0.0); window];

    for frame in mono.chunks_exact(window).take(n_frames) {
        for ((slot, &x), &w) in buffer.iter_mut().zip(frame).zip(&hann) {
            *slot = Complex::new(x * w, 0.0);
        }
        fft.process(&mut buffer);

        // DC carries no imaginary part
        spectrum[0] += buffer[0].re * buffer[0].re;
        for (acc, bin) in spectrum.iter_mut().zip(&buffer).skip(1) {
            *acc += bin.norm_sqr();
        }
    }

    (spectrum, n_frames)
}

/// Convert an accumulated power spectrum to band levels
///
/// # Errors
///
/// `DegenerateInput` if the spectrum is all zero.
pub fn band_levels(spectrum: &[f32], window: usize) -> Result<BandLevels, AnalysisError> {
    let magnitude: Vec<f32> = spectrum.iter().map(|p| (p / window as f32).sqrt()).collect();
    let peak = magnitude[1..].iter().copied().fold(0.0f32, f32::max);
    if !(peak > 0.0) {
        return Err(AnalysisError::DegenerateInput(
            "power spectrum is all zero".to_string(),
        ));
    }

    let db: Vec<f32> = magnitude
        .iter()
        .map(|m| 20.0 * (m / peak).log10() - 3.0)
        .collect();
    let mean = |range: RangeInclusive<usize>| {
        let len = range.clone().count() as f32;
        db[range].iter().sum::<f32>() / len
    };

    Ok(BandLevels {
        low: mean(LOW),
        low_mid: mean(LOW_MID),
        mid: mean(MID),
        mid_high: mean(MID_HIGH),
        high: mean(HIGH),
    })
}

/// Frequency balance rating of a track
///
/// # Arguments
///
/// * `track` - Decoded track
/// * `config` - Provides the FFT window length
///
/// # Returns
///
/// [`BandLevels::rating`] of the averaged spectrum
///
/// # Errors
///
/// `DegenerateInput` for tracks shorter than one window or with an
/// all-zero spectrum; `NumericalError` if a band holds a zero-power bin.
pub fn frequency_rating(track: &Track, config: &AnalysisConfig) -> Result<f32, AnalysisError> {
    let window = config.frequency_window;
    if window < MIN_WINDOW {
        return Err(AnalysisError::InvalidInput(format!(
            "Frequency window {} below {}",
            window, MIN_WINDOW
        )));
    }

    let (spectrum, n_frames) = power_spectrum(track.samples(), track.channels(), window);
    if n_frames == 0 {
        return Err(AnalysisError::DegenerateInput(format!(
            "{} frames is shorter than one {}-sample window",
            track.frames(),
            window
        )));
    }

    let bands = band_levels(&spectrum, window)?;
    let rating = bands.rating();
    log::debug!(
        "Frequency: {} frames, bands={:?}, rating={:.4}",
        n_frames,
        bands,
        rating
    );
    AnalysisError::ensure_finite("frequency", rating)
}
