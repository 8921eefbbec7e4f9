//! Tempo and attack analysis
//!
//! Klapuri-style onset and periodicity estimation:
//!
//! 1. Down-mix to mono and standardize (zero mean, unit variance)
//! 2. Split into bands with a bank of FIR bandpass filters and measure each
//!    band's energy over half-overlapping windows
//! 3. Turn each band envelope into an activity curve (compansion,
//!    smoothing, rectified difference)
//! 4. Sum the bands; the spectrum of the sum gives the tempo rating and its
//!    mass gives the attack rating

pub mod envelope;
pub mod filter_bank;
pub mod lowpass;
pub mod peak_picking;
pub mod periodicity;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::track::Track;
use crate::preprocessing::channel_mixer::downmix_to_mono;
use crate::preprocessing::normalization::standardize;
use envelope::{band_activity, ActivityParams};
use filter_bank::{filter_bank, window_count};
use periodicity::{combined_rating, spectral_peaks, PeriodicityParams, TempoPeak};
use rayon::prelude::*;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

/// Band count the attack calibration was fitted with
const REFERENCE_BANDS: f64 = 36.0;

/// Attack calibration: `ATTACK_SLOPE * mass / samples + ATTACK_OFFSET`
const ATTACK_SLOPE: f64 = -1142.0;
const ATTACK_OFFSET: f64 = 56.0;

/// Minimum number of envelope windows
const MIN_WINDOWS: usize = 2;

/// Result of the tempo/attack analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Periodicity peaks, strongest first
    pub peaks: Vec<TempoPeak>,
    /// Combined tempo rating
    pub rating: f32,
    /// Attack rating
    pub attack: f32,
}

/// Envelope window length in samples for a given rate
pub fn envelope_window(config: &AnalysisConfig, sample_rate: u32) -> usize {
    (config.tempo_window_ms as f64 / 1000.0 * sample_rate as f64).round() as usize
}

/// Tempo and attack ratings of a track
///
/// # Errors
///
/// - `DegenerateInput` for constant or too-short signals, or when no
///   periodicity peak is found
/// - `InvalidInput` if the envelope low-pass cannot be designed
/// - `NumericalError` if a rating is not finite
pub fn tempo_attack_rating(
    track: &Track,
    config: &AnalysisConfig,
) -> Result<TempoEstimate, AnalysisError> {
    let sample_rate = track.sample_rate();
    let window = envelope_window(config, sample_rate);
    let hop = window / 2;

    // Private copy: the track buffer is never touched
    let mut mono = downmix_to_mono(track.samples(), track.channels());
    let n_mono = mono.len();
    let n_windows = window_count(n_mono, window);
    if hop == 0 || n_windows < MIN_WINDOWS {
        return Err(AnalysisError::DegenerateInput(format!(
            "{} samples yield {} envelope windows of {} samples",
            n_mono, n_windows, window
        )));
    }

    standardize(&mut mono)?;
    let signal: Vec<f64> = mono.into_iter().map(f64::from).collect();

    let curve_rate = 2.0 * sample_rate as f64 / hop as f64;
    let activity_params = ActivityParams {
        mu: config.tempo_mu,
        lambda: config.tempo_lambda,
        cutoff_hz: config.tempo_lowpass_hz,
        curve_rate,
    };

    let bank = filter_bank(config.tempo_bands, sample_rate as f64, config.tempo_fir_taps);
    let fft = FftPlanner::<f64>::new().plan_fft_forward(window);

    log::debug!(
        "Tempo: {} mono samples, window={} hop={}, {} windows, {} bands, curve rate {:.3} Hz",
        n_mono,
        window,
        hop,
        n_windows,
        bank.len(),
        curve_rate
    );

    let activities: Vec<Vec<f64>> = bank
        .into_par_iter()
        .map(|fir| {
            let coarse = fir.coarse_envelope(&signal, window, fft.as_ref());
            log::trace!(
                "Band {:.0}-{:.0} Hz: {} envelope samples",
                fir.low_hz,
                fir.high_hz,
                coarse.len()
            );
            band_activity(&coarse, &activity_params)
        })
        .collect::<Result<_, _>>()?;

    // Band order is fixed, so the sum is independent of scheduling
    let mut aggregate = vec![0.0f64; 2 * n_windows];
    for activity in &activities {
        for (acc, &a) in aggregate.iter_mut().zip(activity) {
            *acc += a;
        }
    }

    let mass: f64 = aggregate.iter().sum();
    let scaled_mass = mass * REFERENCE_BANDS / config.tempo_bands as f64;
    let attack = (ATTACK_SLOPE * scaled_mass / n_mono as f64 + ATTACK_OFFSET) as f32;

    let peaks = spectral_peaks(
        &aggregate,
        &PeriodicityParams {
            curve_rate,
            min_hz: config.tempo_min_hz,
            max_hz: config.tempo_max_hz,
            separation_hz: config.peak_separation_hz,
        },
    )?;
    let rating = combined_rating(&peaks).ok_or_else(|| {
        AnalysisError::DegenerateInput("periodicity spectrum has no energy".to_string())
    })?;

    log::debug!(
        "Tempo peaks: {:?}, rating={:.4}, attack={:.4} (mass={:.3})",
        peaks
            .iter()
            .map(|p| (p.frequency_hz, p.rating))
            .collect::<Vec<_>>(),
        rating,
        attack,
        mass
    );

    Ok(TempoEstimate {
        peaks,
        rating: AnalysisError::ensure_finite("tempo", rating)?,
        attack: AnalysisError::ensure_finite("attack", attack)?,
    })
}
