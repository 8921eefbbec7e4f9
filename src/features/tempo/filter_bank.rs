//! Bandpass filter bank and coarse band envelopes
//!
//! Each band is a linear-phase FIR bandpass (Hamming-windowed sinc). The
//! signal is cut into half-overlapping windows; the filter restarts from a
//! zero state at every window, and the energy of the filtered window's
//! spectrum becomes one envelope sample.

use crate::features::window::hamming;
use rustfft::num_complex::Complex;
use rustfft::Fft;
use std::f64::consts::PI;

/// Lowest band edge in Hz
const LOWEST_EDGE_HZ: f64 = 44.0;

/// Highest band edge as a fraction of Nyquist
const HIGHEST_EDGE_NYQUIST: f64 = 0.9;

/// FIR bandpass filter for one band
#[derive(Debug, Clone)]
pub struct BandpassFir {
    /// Lower cutoff in Hz
    pub low_hz: f64,
    /// Upper cutoff in Hz
    pub high_hz: f64,
    taps: Vec<f64>,
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

impl BandpassFir {
    /// Design a windowed-sinc bandpass with `n_taps` coefficients
    pub fn design(low_hz: f64, high_hz: f64, sample_rate: f64, n_taps: usize) -> Self {
        let f1 = low_hz / sample_rate;
        let f2 = high_hz / sample_rate;
        let center = (n_taps as f64 - 1.0) / 2.0;
        let window = hamming(n_taps);

        let taps = window
            .iter()
            .enumerate()
            .map(|(n, w)| {
                let m = n as f64 - center;
                w * (2.0 * f2 * sinc(2.0 * f2 * m) - 2.0 * f1 * sinc(2.0 * f1 * m))
            })
            .collect();

        Self {
            low_hz,
            high_hz,
            taps,
        }
    }

    /// Filter coefficients
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Magnitude response at `freq_hz`
    pub fn gain_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sample_rate;
        self.taps
            .iter()
            .enumerate()
            .map(|(n, &h)| Complex::from_polar(h, -omega * n as f64))
            .sum::<Complex<f64>>()
            .norm()
    }

    /// Filter a whole signal from a zero initial state
    pub fn filter(&self, signal: &[f64]) -> Vec<f64> {
        (0..signal.len())
            .map(|i| self.output_at(signal, i, i))
            .collect()
    }

    /// Output at index `i` when the filter has seen `history` earlier samples
    fn output_at(&self, signal: &[f64], i: usize, history: usize) -> f64 {
        let reach = history.min(self.taps.len() - 1);
        (0..=reach).map(|k| self.taps[k] * signal[i - k]).sum()
    }

    /// Coarse energy envelope over half-overlapping windows
    ///
    /// Each window is filtered from a zero state, transformed, and its
    /// energy over bins `0..=window/2` becomes one envelope sample.
    pub fn coarse_envelope(&self, signal: &[f64], window: usize, fft: &dyn Fft<f64>) -> Vec<f64> {
        let hop = window / 2;
        let n_windows = window_count(signal.len(), window);

        let mut buffer = vec![Complex::new(0.0, 0.0); window];
        let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let mut envelope = Vec::with_capacity(n_windows);

        for w in 0..n_windows {
            let start = w * hop;
            for (j, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(self.output_at(signal, start + j, j), 0.0);
            }
            fft.process_with_scratch(&mut buffer, &mut scratch);
            envelope.push(buffer[..=window / 2].iter().map(|x| x.norm_sqr()).sum());
        }
        envelope
    }
}

/// Number of half-overlapping windows that fit in `len` samples
pub fn window_count(len: usize, window: usize) -> usize {
    let hop = (window / 2).max(1);
    if window == 0 || len < window {
        0
    } else {
        (len - window) / hop + 1
    }
}

/// Build `bands` filters with log-spaced edges from 44 Hz to 90% of Nyquist
pub fn filter_bank(bands: usize, sample_rate: f64, n_taps: usize) -> Vec<BandpassFir> {
    let low = LOWEST_EDGE_HZ;
    let high = HIGHEST_EDGE_NYQUIST * sample_rate / 2.0;
    let ratio = high / low;

    (0..bands)
        .map(|i| {
            let f1 = low * ratio.powf(i as f64 / bands as f64);
            let f2 = low * ratio.powf((i + 1) as f64 / bands as f64);
            BandpassFir::design(f1, f2, sample_rate, n_taps)
        })
        .collect()
}
