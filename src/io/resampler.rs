//! Sample-rate conversion behind a single strategy interface
//!
//! Decoded frames arrive with arbitrary lengths while rubato resamplers
//! consume fixed-size chunks. [`ChunkedResampler`] bridges the two: it
//! queues planar input, feeds whole chunks to the inner resampler, drops the
//! resampler's output delay so the result stays time-aligned with the
//! source, and on [`FrameResampler::finish`] flushes the tail and trims the
//! output to `round(frames_in * ratio)` frames.
//!
//! The implementation is chosen at configuration time through
//! [`ResamplerKind`].

use crate::error::AnalysisError;
use rubato::{
    FftFixedIn, Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};
use serde::{Deserialize, Serialize};

/// Input chunk length fed to the inner resampler, in frames
const CHUNK_FRAMES: usize = 1024;

/// Upper bound on flush iterations in `finish`
const MAX_FLUSH_PASSES: usize = 32;

/// Resampling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplerKind {
    /// Band-limited sinc interpolation (rubato `SincFixedIn`)
    Sinc,
    /// FFT-based synchronous resampling (rubato `FftFixedIn`)
    Fft,
}

/// Streaming resampler over planar `f32` frames
pub trait FrameResampler {
    /// Queue one decoded frame (one `Vec` per channel) and return whatever
    /// output is ready
    fn push(&mut self, planar: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, AnalysisError>;

    /// Flush queued input and the delay line; returns the remaining output
    fn finish(&mut self) -> Result<Vec<Vec<f32>>, AnalysisError>;
}

/// Build the resampler selected by `kind`
///
/// # Errors
///
/// Returns `CodecFailure` if rubato rejects the rates or channel count.
pub fn build_resampler(
    kind: ResamplerKind,
    from_rate: u32,
    to_rate: u32,
    channels: usize,
) -> Result<Box<dyn FrameResampler>, AnalysisError> {
    if from_rate == 0 || to_rate == 0 || channels == 0 {
        return Err(AnalysisError::CodecFailure(format!(
            "Cannot resample {} Hz -> {} Hz with {} channels",
            from_rate, to_rate, channels
        )));
    }

    log::debug!(
        "Building {:?} resampler: {} Hz -> {} Hz, {} channels",
        kind,
        from_rate,
        to_rate,
        channels
    );

    let ratio = to_rate as f64 / from_rate as f64;
    let construction_failed =
        |e: rubato::ResamplerConstructionError| AnalysisError::CodecFailure(e.to_string());

    match kind {
        ResamplerKind::Sinc => {
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            let inner = SincFixedIn::<f32>::new(ratio, 1.1, params, CHUNK_FRAMES, channels)
                .map_err(construction_failed)?;
            Ok(Box::new(ChunkedResampler::new(inner, channels, ratio)))
        }
        ResamplerKind::Fft => {
            let inner = FftFixedIn::<f32>::new(
                from_rate as usize,
                to_rate as usize,
                CHUNK_FRAMES,
                2,
                channels,
            )
            .map_err(construction_failed)?;
            Ok(Box::new(ChunkedResampler::new(inner, channels, ratio)))
        }
    }
}

/// Adapter feeding fixed-size chunks to a rubato resampler
pub struct ChunkedResampler<R> {
    inner: R,
    channels: usize,
    ratio: f64,
    /// Queued input, one `Vec` per channel
    pending: Vec<Vec<f32>>,
    /// Output frames still to drop to compensate the filter delay
    delay: usize,
    frames_in: u64,
    frames_out: u64,
}

impl<R: Resampler<f32>> ChunkedResampler<R> {
    fn new(inner: R, channels: usize, ratio: f64) -> Self {
        let delay = inner.output_delay();
        Self {
            inner,
            channels,
            ratio,
            pending: vec![Vec::new(); channels],
            delay,
            frames_in: 0,
            frames_out: 0,
        }
    }

    /// Append resampler output to `out`, dropping delay frames first
    fn emit(&mut self, produced: Vec<Vec<f32>>, out: &mut [Vec<f32>]) {
        let frames = produced.first().map(|c| c.len()).unwrap_or(0);
        let skip = self.delay.min(frames);
        self.delay -= skip;
        for (dst, src) in out.iter_mut().zip(produced.iter()) {
            dst.extend_from_slice(&src[skip..]);
        }
        self.frames_out += (frames - skip) as u64;
    }

    fn expected_output(&self) -> u64 {
        (self.frames_in as f64 * self.ratio).round() as u64
    }
}

impl<R: Resampler<f32>> FrameResampler for ChunkedResampler<R> {
    fn push(&mut self, planar: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, AnalysisError> {
        if planar.len() != self.channels {
            return Err(AnalysisError::CodecFailure(format!(
                "Resampler expects {} channels, got {}",
                self.channels,
                planar.len()
            )));
        }

        for (queue, channel) in self.pending.iter_mut().zip(planar) {
            queue.extend_from_slice(channel);
        }
        self.frames_in += planar.first().map(|c| c.len()).unwrap_or(0) as u64;

        let mut out = vec![Vec::new(); self.channels];
        loop {
            let needed = self.inner.input_frames_next();
            if self.pending[0].len() < needed {
                break;
            }
            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|queue| queue.drain(..needed).collect())
                .collect();
            let produced = self
                .inner
                .process(&chunk, None)
                .map_err(|e| AnalysisError::CodecFailure(format!("Resampling failed: {}", e)))?;
            self.emit(produced, &mut out);
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<Vec<f32>>, AnalysisError> {
        let mut out = vec![Vec::new(); self.channels];
        let expected = self.expected_output();

        if !self.pending[0].is_empty() {
            let tail = std::mem::replace(&mut self.pending, vec![Vec::new(); self.channels]);
            let produced = self
                .inner
                .process_partial(Some(tail.as_slice()), None)
                .map_err(|e| AnalysisError::CodecFailure(format!("Resampling failed: {}", e)))?;
            self.emit(produced, &mut out);
        }

        for _ in 0..MAX_FLUSH_PASSES {
            if self.frames_out >= expected {
                break;
            }
            let produced = self
                .inner
                .process_partial(None::<&[Vec<f32>]>, None)
                .map_err(|e| AnalysisError::CodecFailure(format!("Resampling failed: {}", e)))?;
            if produced.first().map(|c| c.is_empty()).unwrap_or(true) {
                break;
            }
            self.emit(produced, &mut out);
        }

        let excess = self.frames_out.saturating_sub(expected) as usize;
        let keep = out[0].len().saturating_sub(excess);
        let removed = out[0].len() - keep;
        for channel in out.iter_mut() {
            channel.truncate(keep);
        }
        self.frames_out -= removed as u64;

        log::debug!(
            "Resampler flushed: {} frames in, {} frames out (expected {})",
            self.frames_in,
            self.frames_out,
            expected
        );
        Ok(out)
    }
}
