//! Audio decoding using Symphonia
//!
//! Turns any container/codec symphonia understands into canonical PCM:
//! interleaved signed 16-bit samples at the configured rate, keeping the
//! source channel count. Three paths exist:
//!
//! - s16 at the canonical rate: samples are copied verbatim
//! - other formats at the canonical rate: per-sample conversion to `i16`
//! - other rates: conversion to `f32`, resampling, conversion to `i16`

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::metadata::TrackTags;
use crate::io::resampler::{build_resampler, FrameResampler};
use crate::io::sample_buffer::PcmBuffer;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, Tag};
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Raw output of a decoding pass, before it is wrapped in a `Track`
#[derive(Debug)]
pub struct DecodedAudio {
    /// Canonical interleaved samples
    pub pcm: PcmBuffer,
    /// Channel count (unchanged from the source)
    pub channels: u16,
    /// Canonical sample rate of `pcm`
    pub sample_rate: u32,
    /// Sample rate of the source stream
    pub source_rate: u32,
    /// Exact duration in seconds
    pub duration_secs: f64,
    /// Whether the resampler was involved
    pub resampled: bool,
    /// Bits per sample of an uncompressed PCM source; `None` for compressed
    /// codecs
    pub pcm_bits_per_sample: Option<u32>,
    /// Descriptive tags
    pub tags: TrackTags,
}

/// Per-call decoding state
///
/// Everything a decoding pass mutates lives here, so concurrent decodes of
/// different files share nothing.
pub(crate) struct DecodeContext {
    target_rate: u32,
    source_rate: u32,
    channels: Option<usize>,
    resampler: Option<Box<dyn FrameResampler>>,
    config: AnalysisConfig,
    pcm: PcmBuffer,
    /// Interleaved conversion scratch
    interleaved: Vec<i16>,
    /// Planar conversion scratch for the resampler
    planar: Vec<Vec<f32>>,
}

impl DecodeContext {
    pub(crate) fn new(
        config: &AnalysisConfig,
        source_rate: u32,
        estimate: usize,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            target_rate: config.sample_rate,
            source_rate,
            channels: None,
            resampler: None,
            config: config.clone(),
            pcm: PcmBuffer::with_estimate(estimate)?,
            interleaved: Vec::new(),
            planar: Vec::new(),
        })
    }

    fn needs_resampling(&self) -> bool {
        self.source_rate != self.target_rate
    }

    /// Convert one decoded frame and append it to the output buffer
    pub(crate) fn push_frame(&mut self, decoded: &AudioBufferRef<'_>) -> Result<(), AnalysisError> {
        let channels = decoded.spec().channels.count();
        match self.channels {
            None => {
                if channels == 0 {
                    return Err(AnalysisError::CodecFailure(
                        "Decoded frame has no channels".to_string(),
                    ));
                }
                self.channels = Some(channels);
                let is_s16 = matches!(decoded, AudioBufferRef::S16(_));
                log::debug!(
                    "Source stream: {} Hz, {} channels, s16={}",
                    self.source_rate,
                    channels,
                    is_s16
                );
                if self.needs_resampling() {
                    self.resampler = Some(build_resampler(
                        self.config.resampler,
                        self.source_rate,
                        self.target_rate,
                        channels,
                    )?);
                }
            }
            Some(expected) if expected != channels => {
                return Err(AnalysisError::CodecFailure(format!(
                    "Channel layout changed mid-stream: {} -> {}",
                    expected, channels
                )));
            }
            Some(_) => {}
        }

        match self.resampler.as_mut() {
            None => {
                self.interleaved.clear();
                interleave_ref(decoded, &mut self.interleaved);
                self.pcm.append(&self.interleaved)
            }
            Some(resampler) => {
                self.planar.resize_with(channels, Vec::new);
                for channel in self.planar.iter_mut() {
                    channel.clear();
                }
                planar_ref(decoded, &mut self.planar);
                let produced = resampler.push(&self.planar)?;
                append_resampled(&mut self.pcm, &mut self.interleaved, &produced)
            }
        }
    }

    /// Flush the resampler and hand over the finished buffer
    pub(crate) fn finish(mut self) -> Result<(PcmBuffer, usize), AnalysisError> {
        if let Some(resampler) = self.resampler.as_mut() {
            let tail = resampler.finish()?;
            append_resampled(&mut self.pcm, &mut self.interleaved, &tail)?;
        }
        Ok((self.pcm, self.channels.unwrap_or(0)))
    }
}

fn append_resampled(
    pcm: &mut PcmBuffer,
    scratch: &mut Vec<i16>,
    planar: &[Vec<f32>],
) -> Result<(), AnalysisError> {
    let frames = planar.first().map(|c| c.len()).unwrap_or(0);
    scratch.clear();
    scratch.reserve(frames * planar.len());
    for frame in 0..frames {
        for channel in planar {
            scratch.push(i16::from_sample(channel[frame]));
        }
    }
    pcm.append(scratch)
}

fn interleave<S: Sample, T: FromSample<S>>(buf: &AudioBuffer<S>, out: &mut Vec<T>) {
    let channels = buf.spec().channels.count();
    out.reserve(buf.frames() * channels);
    for frame in 0..buf.frames() {
        for ch in 0..channels {
            out.push(T::from_sample(buf.chan(ch)[frame]));
        }
    }
}

fn deinterleave<S: Sample>(buf: &AudioBuffer<S>, out: &mut [Vec<f32>])
where
    f32: FromSample<S>,
{
    for (ch, dst) in out.iter_mut().enumerate() {
        dst.extend(buf.chan(ch).iter().map(|&s| f32::from_sample(s)));
    }
}

/// Interleave any decoded buffer as `i16` (identity for s16 sources)
fn interleave_ref(decoded: &AudioBufferRef<'_>, out: &mut Vec<i16>) {
    match decoded {
        AudioBufferRef::U8(buf) => interleave(&**buf, out),
        AudioBufferRef::U16(buf) => interleave(&**buf, out),
        AudioBufferRef::U24(buf) => interleave(&**buf, out),
        AudioBufferRef::U32(buf) => interleave(&**buf, out),
        AudioBufferRef::S8(buf) => interleave(&**buf, out),
        AudioBufferRef::S16(buf) => interleave(&**buf, out),
        AudioBufferRef::S24(buf) => interleave(&**buf, out),
        AudioBufferRef::S32(buf) => interleave(&**buf, out),
        AudioBufferRef::F32(buf) => interleave(&**buf, out),
        AudioBufferRef::F64(buf) => interleave(&**buf, out),
    }
}

/// Convert any decoded buffer to planar `f32` for the resampler
fn planar_ref(decoded: &AudioBufferRef<'_>, out: &mut [Vec<f32>]) {
    match decoded {
        AudioBufferRef::U8(buf) => deinterleave(&**buf, out),
        AudioBufferRef::U16(buf) => deinterleave(&**buf, out),
        AudioBufferRef::U24(buf) => deinterleave(&**buf, out),
        AudioBufferRef::U32(buf) => deinterleave(&**buf, out),
        AudioBufferRef::S8(buf) => deinterleave(&**buf, out),
        AudioBufferRef::S16(buf) => deinterleave(&**buf, out),
        AudioBufferRef::S24(buf) => deinterleave(&**buf, out),
        AudioBufferRef::S32(buf) => deinterleave(&**buf, out),
        AudioBufferRef::F32(buf) => deinterleave(&**buf, out),
        AudioBufferRef::F64(buf) => deinterleave(&**buf, out),
    }
}

/// Decode an audio file to canonical PCM
///
/// # Errors
///
/// - `OpenFailure` if the file cannot be opened
/// - `StreamNotFound` if the format is not recognized or has no audio track
/// - `CodecFailure` if no decoder or resampler can be built, or a packet
///   cannot be read (a track is never silently truncated)
/// - `AllocationFailure` if the sample buffer cannot grow
/// - `EmptyDecode` if a full pass yields no samples
pub fn decode_audio(path: &Path, config: &AnalysisConfig) -> Result<DecodedAudio, AnalysisError> {
    log::debug!("Decoding audio file: {}", path.display());

    let file = File::open(path)
        .map_err(|e| AnalysisError::OpenFailure(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AnalysisError::StreamNotFound(format!("{}: {}", path.display(), e)))?;

    // Container tags first, then anything found while probing (e.g. ID3v2)
    let mut tags: Vec<Tag> = Vec::new();
    if let Some(revision) = probed.format.metadata().current() {
        tags.extend(revision.tags().iter().cloned());
    }
    if let Some(metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.current() {
            tags.extend(revision.tags().iter().cloned());
        }
    }
    let tags = TrackTags::from_tags(&tags);

    let mut format = probed.format;
    let (mut track_id, codec_params) = select_track(format.as_ref(), path)?;

    let source_rate = codec_params.sample_rate.ok_or_else(|| {
        AnalysisError::CodecFailure(format!("{}: unknown sample rate", path.display()))
    })?;
    let declared_frames = codec_params.n_frames;
    let declared_channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);
    let pcm_bits = pcm_bits_per_sample(&codec_params);

    let mut decoder = make_decoder(&codec_params, path)?;

    let estimate = declared_frames
        .map(|frames| {
            let ratio = config.sample_rate as f64 / source_rate as f64;
            (frames as f64 * ratio).ceil() as usize * declared_channels
        })
        .unwrap_or(0);
    log::debug!(
        "Pre-sizing sample buffer for {} samples ({:?} declared frames)",
        estimate,
        declared_frames
    );

    let mut context = DecodeContext::new(config, source_rate, estimate)?;
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(e) => match classify_read_error(e, path) {
                PacketFlow::EndOfStream => break,
                PacketFlow::Reset => {
                    let (id, params) = select_track(format.as_ref(), path)?;
                    if params.sample_rate != Some(source_rate) {
                        return Err(AnalysisError::CodecFailure(format!(
                            "{}: chained stream changes sample rate from {} Hz to {:?}",
                            path.display(),
                            source_rate,
                            params.sample_rate
                        )));
                    }
                    log::debug!("Stream reset in {}: continuing with track {}", path.display(), id);
                    decoder = make_decoder(&params, path)?;
                    track_id = id;
                    continue;
                }
                PacketFlow::Fail(err) => return Err(err),
            },
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => context.push_frame(&decoded)?,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped += 1;
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
            }
            Err(SymphoniaError::IoError(e)) => {
                skipped += 1;
                log::warn!("Skipping unreadable packet in {}: {}", path.display(), e);
            }
            Err(e) => {
                return Err(AnalysisError::CodecFailure(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    let resampled = source_rate != config.sample_rate;
    let (pcm, channels) = context.finish()?;

    if pcm.is_empty() || channels == 0 {
        return Err(AnalysisError::EmptyDecode(path.display().to_string()));
    }

    let decoded_frames = pcm.len() / channels;
    let duration_secs = match declared_frames {
        Some(frames) if frames > 0 => frames as f64 / source_rate as f64,
        _ => decoded_frames as f64 / config.sample_rate as f64,
    };

    log::debug!(
        "Decoded {} samples ({} frames, {} channels, {} skipped packets, resampled={})",
        pcm.len(),
        decoded_frames,
        channels,
        skipped,
        resampled
    );

    Ok(DecodedAudio {
        pcm,
        channels: channels as u16,
        sample_rate: config.sample_rate,
        source_rate,
        duration_secs,
        resampled,
        pcm_bits_per_sample: pcm_bits,
        tags,
    })
}

/// Outcome of a failed packet read
#[derive(Debug)]
enum PacketFlow {
    /// Clean end of the stream
    EndOfStream,
    /// The reader switched streams; the track and decoder must be rebuilt
    Reset,
    /// Unrecoverable; continuing would truncate the track
    Fail(AnalysisError),
}

fn classify_read_error(err: SymphoniaError, path: &Path) -> PacketFlow {
    match err {
        SymphoniaError::IoError(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            PacketFlow::EndOfStream
        }
        SymphoniaError::ResetRequired => PacketFlow::Reset,
        e => PacketFlow::Fail(AnalysisError::CodecFailure(format!(
            "{}: unreadable packet: {}",
            path.display(),
            e
        ))),
    }
}

/// First decodable track: its id and codec parameters
fn select_track(
    format: &dyn FormatReader,
    path: &Path,
) -> Result<(u32, CodecParameters), AnalysisError> {
    format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| AnalysisError::StreamNotFound(path.display().to_string()))
}

fn make_decoder(params: &CodecParameters, path: &Path) -> Result<Box<dyn Decoder>, AnalysisError> {
    symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::CodecFailure(format!("{}: {}", path.display(), e)))
}

/// Sample width of uncompressed PCM codecs
fn pcm_bits_per_sample(params: &CodecParameters) -> Option<u32> {
    let is_pcm = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map_or(false, |descriptor| descriptor.short_name.starts_with("pcm"));
    if is_pcm {
        params.bits_per_sample
    } else {
        None
    }
}
