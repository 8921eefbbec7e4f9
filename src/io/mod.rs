//! Audio I/O modules
//!
//! Decoding to canonical PCM using Symphonia, resampling with rubato, and
//! tag extraction.

pub mod decoder;
pub mod metadata;
pub mod resampler;
pub mod sample_buffer;
pub mod track;

pub use metadata::TrackTags;
pub use resampler::ResamplerKind;
pub use track::{Track, TrackInfo};
