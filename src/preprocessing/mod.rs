//! Audio preprocessing modules
//!
//! Helpers shared by the analyzers:
//! - Silence trimming (exact-zero runs at both ends)
//! - Channel down-mixing (interleaved to mono)
//! - Zero-mean/unit-variance normalization with streaming statistics

pub mod channel_mixer;
pub mod normalization;
pub mod silence;
