//! Decoded track: canonical PCM plus metadata

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::decoder::decode_audio;
use crate::io::metadata::TrackTags;
use crate::io::sample_buffer::PcmBuffer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bytes per canonical sample (signed 16-bit)
pub const BYTES_PER_SAMPLE: usize = 2;

/// Metadata of a decoded track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Source path
    pub path: PathBuf,
    /// Channel count
    pub channels: u16,
    /// Canonical sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved sample count across all channels
    pub n_samples: usize,
    /// Bytes per sample (always 2)
    pub bytes_per_sample: usize,
    /// Duration in whole seconds
    pub duration: u64,
    /// Bit rate in bits per second: the stream rate for PCM sources, the
    /// average over the file otherwise
    pub bitrate: u64,
    /// Whether the source went through the resampler
    pub resampled: bool,
    /// Descriptive tags
    pub tags: TrackTags,
}

/// A fully decoded track
///
/// The sample buffer is fixed once decoding completes: analyzers only ever
/// see `&Track`.
#[derive(Debug, Clone)]
pub struct Track {
    info: TrackInfo,
    pcm: PcmBuffer,
}

impl Track {
    /// Decode a file into canonical PCM
    ///
    /// # Errors
    ///
    /// Any decoding error; no partially decoded track is ever returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mood_dsp::{AnalysisConfig, Track};
    ///
    /// let track = Track::decode("song.flac", &AnalysisConfig::default())?;
    /// println!("{} samples, {} channels", track.n_samples(), track.channels());
    /// # Ok::<(), mood_dsp::AnalysisError>(())
    /// ```
    pub fn decode<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        config.validate()?;

        let decoded = decode_audio(path, config)?;
        let file_bytes = std::fs::metadata(path)
            .map_err(|e| AnalysisError::OpenFailure(format!("{}: {}", path.display(), e)))?
            .len();

        // PCM streams report their stream rate; compressed ones the average
        // over the whole file
        let bitrate = match decoded.pcm_bits_per_sample {
            Some(bits) => decoded.source_rate as u64 * decoded.channels as u64 * bits as u64,
            None if decoded.duration_secs > 0.0 => {
                (file_bytes as f64 * 8.0 / decoded.duration_secs).round() as u64
            }
            None => 0,
        };

        let info = TrackInfo {
            path: path.to_path_buf(),
            channels: decoded.channels,
            sample_rate: decoded.sample_rate,
            n_samples: decoded.pcm.len(),
            bytes_per_sample: BYTES_PER_SAMPLE,
            duration: decoded.duration_secs as u64,
            bitrate,
            resampled: decoded.resampled,
            tags: decoded.tags,
        };

        log::debug!(
            "Track ready: {} ({} samples, {} ch, {} s, {} bps)",
            info.path.display(),
            info.n_samples,
            info.channels,
            info.duration,
            info.bitrate
        );

        Ok(Self {
            info,
            pcm: decoded.pcm,
        })
    }

    /// Build a track from samples that are already canonical
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the layout is inconsistent, `EmptyDecode` if there
    /// are no samples.
    pub fn from_samples(
        samples: &[i16],
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        if channels == 0 || sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid layout: {} channels at {} Hz",
                channels, sample_rate
            )));
        }
        if samples.is_empty() {
            return Err(AnalysisError::EmptyDecode("no samples".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                channels
            )));
        }

        let mut pcm = PcmBuffer::with_estimate(samples.len())?;
        pcm.append(samples)?;

        let frames = samples.len() / channels as usize;
        let info = TrackInfo {
            path: PathBuf::new(),
            channels,
            sample_rate,
            n_samples: samples.len(),
            bytes_per_sample: BYTES_PER_SAMPLE,
            duration: frames as u64 / sample_rate as u64,
            bitrate: sample_rate as u64 * channels as u64 * BYTES_PER_SAMPLE as u64 * 8,
            resampled: false,
            tags: TrackTags::default(),
        };
        Ok(Self { info, pcm })
    }

    /// Track metadata
    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    /// Consume the track, keeping only its metadata
    pub fn into_info(self) -> TrackInfo {
        self.info
    }

    /// Interleaved canonical samples
    pub fn samples(&self) -> &[i16] {
        self.pcm.samples()
    }

    /// Canonical little-endian byte image of the samples
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.pcm.to_le_bytes()
    }

    /// Interleaved sample count across all channels
    pub fn n_samples(&self) -> usize {
        self.info.n_samples
    }

    /// Channel count
    pub fn channels(&self) -> usize {
        self.info.channels as usize
    }

    /// Sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.info.n_samples / self.channels()
    }

    /// Canonical sample rate
    pub fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_samples_layout() {
        let samples = vec![1i16; 22050 * 2 * 3];
        let track = Track::from_samples(&samples, 2, 22050).unwrap();
        assert_eq!(track.n_samples(), 132300);
        assert_eq!(track.frames(), 66150);
        assert_eq!(track.info().duration, 3);
        assert_eq!(track.to_le_bytes().len(), track.n_samples() * BYTES_PER_SAMPLE);
        assert_eq!(track.info().tags, TrackTags::default());
    }

    #[test]
    fn test_from_samples_rejects_bad_layout() {
        assert!(matches!(
            Track::from_samples(&[1, 2, 3], 2, 22050),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            Track::from_samples(&[], 1, 22050),
            Err(AnalysisError::EmptyDecode(_))
        ));
        assert!(Track::from_samples(&[1], 0, 22050).is_err());
    }

    #[test]
    fn test_missing_file_is_open_failure() {
        let result = Track::decode("/definitely/not/here.flac", &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::OpenFailure(_))));
    }
}
