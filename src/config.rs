//! Configuration parameters for track analysis

use crate::error::AnalysisError;
use crate::io::resampler::ResamplerKind;
use serde::{Deserialize, Serialize};

/// Analysis configuration parameters
///
/// Every field has a calibrated default; the rating formulas are fitted
/// against these values, so changing the analysis parameters shifts the
/// scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Decoding
    /// Canonical sample rate every track is converted to (default: 22050)
    pub sample_rate: u32,

    /// Resampling strategy used when the source rate differs (default: Sinc)
    pub resampler: ResamplerKind,

    /// Run the three analyzers concurrently (default: true)
    pub parallel_analyzers: bool,

    // Amplitude
    /// Number of histogram smoothing passes (default: 300)
    pub amplitude_passes: usize,

    /// Upper bound (inclusive) of the histogram integral (default: 2000)
    pub amplitude_integral_sup: usize,

    // Frequency
    /// Window length of the frequency analyzer FFT (default: 512)
    ///
    /// Band boundaries are expressed in bins of this window, so it must be
    /// at least 236 samples long.
    pub frequency_window: usize,

    // Tempo / attack
    /// Number of bandpass filters in the tempo filter bank (default: 8)
    pub tempo_bands: usize,

    /// Number of taps of each bandpass FIR filter (default: 33)
    pub tempo_fir_taps: usize,

    /// Length of the envelope analysis window in milliseconds (default: 23.0)
    pub tempo_window_ms: f32,

    /// Compression constant of the envelope log-compansion (default: 100.0)
    pub tempo_mu: f64,

    /// Weight of the onset curve in the band activity (default: 0.8)
    pub tempo_lambda: f64,

    /// Cutoff of the envelope low-pass filter in Hz (default: 10.0)
    pub tempo_lowpass_hz: f64,

    /// Lowest periodicity considered, in Hz (default: 0.5)
    pub tempo_min_hz: f64,

    /// Highest periodicity considered, in Hz (default: 20.0)
    pub tempo_max_hz: f64,

    /// Minimum distance between two tempo peaks, in Hz (default: 0.25)
    pub peak_separation_hz: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            resampler: ResamplerKind::Sinc,
            parallel_analyzers: true,
            amplitude_passes: 300,
            amplitude_integral_sup: 2000,
            frequency_window: 512,
            tempo_bands: 8,
            tempo_fir_taps: 33,
            tempo_window_ms: 23.0,
            tempo_mu: 100.0,
            tempo_lambda: 0.8,
            tempo_lowpass_hz: 10.0,
            tempo_min_hz: 0.5,
            tempo_max_hz: 20.0,
            peak_separation_hz: 0.25,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from JSON; missing fields keep their defaults
    ///
    /// # Example
    ///
    /// ```
    /// use mood_dsp::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::from_json(r#"{ "tempo_bands": 1 }"#)?;
    /// assert_eq!(config.tempo_bands, 1);
    /// assert_eq!(config.sample_rate, 22050);
    /// # Ok::<(), mood_dsp::AnalysisError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidInput(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the analyzers cannot work with
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: String| Err(AnalysisError::InvalidInput(msg));

        if self.sample_rate < 8000 {
            return invalid(format!("Sample rate too low: {}", self.sample_rate));
        }
        if self.frequency_window < crate::features::frequency::MIN_WINDOW {
            return invalid(format!(
                "Frequency window must be >= {}, got {}",
                crate::features::frequency::MIN_WINDOW,
                self.frequency_window
            ));
        }
        if self.amplitude_passes == 0 {
            return invalid("Amplitude smoothing needs at least one pass".to_string());
        }
        if self.amplitude_integral_sup >= crate::features::amplitude::HISTOGRAM_SIZE {
            return invalid(format!(
                "Integral bound {} exceeds histogram",
                self.amplitude_integral_sup
            ));
        }
        if self.tempo_bands == 0 {
            return invalid("Tempo filter bank needs at least one band".to_string());
        }
        if self.tempo_fir_taps < 3 || self.tempo_fir_taps % 2 == 0 {
            return invalid(format!(
                "FIR tap count must be odd and >= 3, got {}",
                self.tempo_fir_taps
            ));
        }
        if !(self.tempo_window_ms > 1.0) {
            return invalid(format!("Window too short: {} ms", self.tempo_window_ms));
        }
        if !(self.tempo_mu > 0.0) {
            return invalid(format!("Compansion constant must be > 0, got {}", self.tempo_mu));
        }
        if !(0.0..=1.0).contains(&self.tempo_lambda) {
            return invalid(format!("Lambda must be in [0, 1], got {}", self.tempo_lambda));
        }
        if !(self.tempo_lowpass_hz > 0.0) {
            return invalid(format!("Low-pass cutoff must be > 0, got {}", self.tempo_lowpass_hz));
        }
        if !(self.tempo_min_hz > 0.0) || self.tempo_max_hz <= self.tempo_min_hz {
            return invalid(format!(
                "Invalid periodicity range: min={}, max={}",
                self.tempo_min_hz, self.tempo_max_hz
            ));
        }
        if self.peak_separation_hz < 0.0 {
            return invalid(format!(
                "Peak separation must be >= 0, got {}",
                self.peak_separation_hz
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = AnalysisConfig::from_json(r#"{"tempo_bands": 2, "resampler": "fft"}"#).unwrap();
        assert_eq!(config.tempo_bands, 2);
        assert_eq!(config.resampler, ResamplerKind::Fft);
        assert_eq!(config.amplitude_passes, 300);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(AnalysisConfig::from_json(r#"{"tempo_bands": 0}"#).is_err());
        assert!(AnalysisConfig::from_json(r#"{"tempo_fir_taps": 32}"#).is_err());
        assert!(AnalysisConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let config = AnalysisConfig {
            tempo_min_hz: 5.0,
            tempo_max_hz: 1.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            frequency_window: 128,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            tempo_lambda: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_smoothing_passes_rejected() {
        let config = AnalysisConfig {
            amplitude_passes: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));
        assert!(AnalysisConfig::from_json(r#"{"amplitude_passes": 0}"#).is_err());

        let config = AnalysisConfig {
            amplitude_passes: 1,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
