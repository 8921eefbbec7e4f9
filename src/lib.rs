//! # Mood DSP
//!
//! A mood analysis engine for music collections: it rates how "loud" or
//! "calm" a track feels and measures how far apart two tracks are, for
//! automatic content-based playlists.
//!
//! ## Features
//!
//! - **Decoding**: any format Symphonia reads, converted to 16-bit PCM at
//!   22050 Hz (resampled with rubato when needed)
//! - **Amplitude**: smoothed magnitude histogram, loudness and dynamics
//! - **Frequency balance**: spectral tilt from averaged power spectra
//! - **Tempo/attack**: filter-bank onset curves and their periodicity
//! - **Distance**: Euclidean distance and cosine similarity of force vectors
//!
//! ## Quick Start
//!
//! ```no_run
//! use mood_dsp::{analyze, distance_by_path};
//!
//! let analysis = analyze("song.flac")?;
//! println!(
//!     "{}: force {:.2} ({})",
//!     analysis.info.tags.title, analysis.force, analysis.classification
//! );
//!
//! let d = distance_by_path("song.flac", "other.mp3")?;
//! println!("distance: {:.3}", d);
//! # Ok::<(), mood_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! File → Decode/Resample → Track → {Amplitude, Frequency, Tempo/Attack} → ForceVector
//! ```
//!
//! The three analyzers only read the decoded track and run concurrently.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

// Re-export main types
pub use analysis::distance::{cosine_similarity, distance};
pub use analysis::result::{Analysis, Classification, ForceVector};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::amplitude::amplitude_rating;
pub use features::frequency::frequency_rating;
pub use features::tempo::{tempo_attack_rating, TempoEstimate};
pub use io::{ResamplerKind, Track, TrackInfo, TrackTags};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze a file with the default configuration
///
/// # Errors
///
/// Any decoding error, or an analyzer rejecting the decoded audio.
pub fn analyze<P: AsRef<Path>>(path: P) -> Result<Analysis, AnalysisError> {
    analyze_with_config(path, &AnalysisConfig::default())
}

/// Analyze a file
///
/// Decodes the file, runs the three analyzers and assembles the force
/// vector. Either everything succeeds or a single error is returned.
///
/// # Example
///
/// ```no_run
/// use mood_dsp::{analyze_with_config, AnalysisConfig};
///
/// let config = AnalysisConfig {
///     tempo_bands: 4,
///     ..AnalysisConfig::default()
/// };
/// let analysis = analyze_with_config("song.ogg", &config)?;
/// println!("{:?}", analysis.force_vector);
/// # Ok::<(), mood_dsp::AnalysisError>(())
/// ```
pub fn analyze_with_config<P: AsRef<Path>>(
    path: P,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    let start_time = Instant::now();
    let track = Track::decode(path, config)?;
    let (force_vector, tempo) = analyze_track(&track, config)?;

    let force = force_vector.force();
    let classification = force_vector.classification();
    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

    let info = track.into_info();
    log::info!(
        "Analyzed {} in {:.0} ms: {:?}, force {:.3} ({})",
        info.path.display(),
        processing_time_ms,
        force_vector,
        force,
        classification
    );

    Ok(Analysis {
        info,
        force_vector,
        force,
        classification,
        tempo,
        processing_time_ms,
    })
}

/// Run the three analyzers on a decoded track
///
/// With `parallel_analyzers` the analyzers run as rayon tasks joined before
/// the vector is assembled; the result is identical either way.
///
/// # Errors
///
/// The first analyzer error, in amplitude, frequency, tempo order.
pub fn analyze_track(
    track: &Track,
    config: &AnalysisConfig,
) -> Result<(ForceVector, TempoEstimate), AnalysisError> {
    config.validate()?;
    log::debug!(
        "Analyzing {} samples ({} channels @ {} Hz)",
        track.n_samples(),
        track.channels(),
        track.sample_rate()
    );

    let (amplitude, (frequency, tempo)) = if config.parallel_analyzers {
        rayon::join(
            || amplitude_rating(track, config),
            || {
                rayon::join(
                    || frequency_rating(track, config),
                    || tempo_attack_rating(track, config),
                )
            },
        )
    } else {
        (
            amplitude_rating(track, config),
            (
                frequency_rating(track, config),
                tempo_attack_rating(track, config),
            ),
        )
    };

    let amplitude = amplitude?;
    let frequency = frequency?;
    let tempo = tempo?;

    let force_vector = ForceVector {
        tempo: tempo.rating,
        amplitude,
        frequency,
        attack: tempo.attack,
    };
    Ok((force_vector, tempo))
}

/// Euclidean distance between the force vectors of two files
///
/// # Errors
///
/// The first analysis error of either file.
pub fn distance_by_path<P: AsRef<Path>>(path1: P, path2: P) -> Result<f32, AnalysisError> {
    let (v1, v2) = analyze_pair(path1.as_ref(), path2.as_ref())?;
    Ok(distance(&v1, &v2))
}

/// Cosine similarity between the force vectors of two files
///
/// `Ok(None)` when either vector is zero.
///
/// # Errors
///
/// The first analysis error of either file.
pub fn cosine_similarity_by_path<P: AsRef<Path>>(
    path1: P,
    path2: P,
) -> Result<Option<f32>, AnalysisError> {
    let (v1, v2) = analyze_pair(path1.as_ref(), path2.as_ref())?;
    Ok(cosine_similarity(&v1, &v2))
}

fn analyze_pair(path1: &Path, path2: &Path) -> Result<(ForceVector, ForceVector), AnalysisError> {
    let (a, b) = rayon::join(|| analyze(path1), || analyze(path2));
    Ok((a?.force_vector, b?.force_vector))
}

/// Analyze many files in parallel, one task per file
///
/// Results come back in input order; one failing file does not affect the
/// others.
pub fn analyze_batch<P: AsRef<Path> + Sync>(
    paths: &[P],
    config: &AnalysisConfig,
) -> Vec<Result<Analysis, AnalysisError>> {
    log::debug!("Analyzing batch of {} files", paths.len());
    paths
        .par_iter()
        .map(|path| analyze_with_config(path, config))
        .collect()
}
