//! Feature extraction modules
//!
//! The three independent analyzers, each turning a decoded track into
//! ratings:
//! - Amplitude (magnitude histogram)
//! - Frequency balance (averaged power spectrum)
//! - Tempo and attack (filter bank, onset curves, periodicity)

pub mod amplitude;
pub mod frequency;
pub mod tempo;
pub mod window;
