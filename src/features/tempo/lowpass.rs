//! Butterworth low-pass filter for band envelopes

use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use std::f64::consts::PI;

/// Filter order; the filter has `ORDER + 1` coefficients per polynomial
pub const ORDER: usize = 6;

/// Direct-form-I IIR low-pass, designed by bilinear transform
///
/// `a[0]` is normalized to 1 and the DC gain to exactly 1.
#[derive(Debug, Clone)]
pub struct ButterworthLowpass {
    b: [f64; ORDER + 1],
    a: [f64; ORDER + 1],
    // Input and output delay lines, most recent first
    x: [f64; ORDER + 1],
    y: [f64; ORDER + 1],
}

impl ButterworthLowpass {
    /// Design the filter for `cutoff_hz` at `sample_rate`
    ///
    /// # Errors
    ///
    /// `InvalidInput` unless `0 < cutoff_hz < sample_rate / 2`.
    pub fn new(cutoff_hz: f64, sample_rate: f64) -> Result<Self, AnalysisError> {
        if !(cutoff_hz > 0.0 && cutoff_hz < sample_rate / 2.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Low-pass cutoff {} Hz outside (0, {}) Hz",
                cutoff_hz,
                sample_rate / 2.0
            )));
        }

        // Pre-warped analog cutoff
        let fs2 = 2.0 * sample_rate;
        let omega = fs2 * (PI * cutoff_hz / sample_rate).tan();

        // Map the left-half-plane prototype poles to z, expanding
        // prod(1 - p_k z^-1) as we go
        let mut a = [Complex::new(0.0, 0.0); ORDER + 1];
        a[0] = Complex::new(1.0, 0.0);
        for k in 0..ORDER {
            let theta = PI * (2 * k + ORDER + 1) as f64 / (2 * ORDER) as f64;
            let s = Complex::from_polar(omega, theta);
            let z = (fs2 + s) / (fs2 - s);
            for i in (1..=k + 1).rev() {
                a[i] = a[i] - z * a[i - 1];
            }
        }
        let a: [f64; ORDER + 1] = std::array::from_fn(|i| a[i].re);

        // All zeros at z = -1: binomial numerator, scaled for unit DC gain
        let mut b = [0.0f64; ORDER + 1];
        b[0] = 1.0;
        for k in 0..ORDER {
            for i in (1..=k + 1).rev() {
                b[i] += b[i - 1];
            }
        }
        let gain = a.iter().sum::<f64>() / b.iter().sum::<f64>();
        for coeff in b.iter_mut() {
            *coeff *= gain;
        }

        log::trace!("Butterworth {} Hz @ {} Hz: b={:?} a={:?}", cutoff_hz, sample_rate, b, a);

        Ok(Self {
            b,
            a,
            x: [0.0; ORDER + 1],
            y: [0.0; ORDER + 1],
        })
    }

    /// Numerator coefficients
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Denominator coefficients (`a[0] == 1`)
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Process one sample
    pub fn process(&mut self, sample: f64) -> f64 {
        self.x.copy_within(0..ORDER, 1);
        self.x[0] = sample;

        let feed_forward: f64 = self.b.iter().zip(&self.x).map(|(b, x)| b * x).sum();
        let feedback: f64 = self.a[1..].iter().zip(&self.y).map(|(a, y)| a * y).sum();
        let output = feed_forward - feedback;

        self.y.copy_within(0..ORDER, 1);
        self.y[0] = output;
        output
    }

    /// Filter a whole signal from the current state
    pub fn process_all(&mut self, signal: &[f64]) -> Vec<f64> {
        signal.iter().map(|&s| self.process(s)).collect()
    }

    /// Clear the delay lines
    pub fn reset(&mut self) {
        self.x = [0.0; ORDER + 1];
        self.y = [0.0; ORDER + 1];
    }

    /// Magnitude response at `freq_hz`
    pub fn gain_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let z_inv = Complex::from_polar(1.0, -2.0 * PI * freq_hz / sample_rate);
        let eval = |coeffs: &[f64]| {
            coeffs
                .iter()
                .rev()
                .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z_inv + c)
        };
        (eval(&self.b) / eval(&self.a)).norm()
    }
}
