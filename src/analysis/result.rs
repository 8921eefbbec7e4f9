//! Analysis result types

use crate::features::tempo::TempoEstimate;
use crate::io::track::TrackInfo;
use serde::{Deserialize, Serialize};

/// Four-component mood feature of a track
///
/// Positive components lean "loud", negative ones "calm".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceVector {
    /// Tempo rating
    pub tempo: f32,
    /// Amplitude rating
    pub amplitude: f32,
    /// Frequency balance rating
    pub frequency: f32,
    /// Attack rating
    pub attack: f32,
}

impl ForceVector {
    /// Components in `[tempo, amplitude, frequency, attack]` order
    pub fn as_array(&self) -> [f32; 4] {
        [self.tempo, self.amplitude, self.frequency, self.attack]
    }

    /// Build from `[tempo, amplitude, frequency, attack]`
    pub fn from_array(v: [f32; 4]) -> Self {
        Self {
            tempo: v[0],
            amplitude: v[1],
            frequency: v[2],
            attack: v[3],
        }
    }

    /// Scalar force: negative tempo and attack are ignored
    ///
    /// # Example
    ///
    /// ```
    /// use mood_dsp::ForceVector;
    ///
    /// let v = ForceVector { tempo: -1.0, amplitude: 2.0, frequency: -0.5, attack: 3.0 };
    /// assert_eq!(v.force(), 4.5);
    /// ```
    pub fn force(&self) -> f32 {
        self.tempo.max(0.0) + self.amplitude + self.frequency + self.attack.max(0.0)
    }

    /// Classification from the sign of [`force`](Self::force)
    pub fn classification(&self) -> Classification {
        Classification::from_force(self.force())
    }
}

/// Loud/calm verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Positive force
    Loud,
    /// Negative force
    Calm,
    /// Force exactly zero
    Unknown,
}

impl Classification {
    /// Classify a scalar force
    pub fn from_force(force: f32) -> Self {
        if force > 0.0 {
            Classification::Loud
        } else if force < 0.0 {
            Classification::Calm
        } else {
            Classification::Unknown
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Classification::Loud => "Loud",
            Classification::Calm => "Calm",
            Classification::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Complete analysis of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Decoded track metadata
    pub info: TrackInfo,

    /// The four ratings
    pub force_vector: ForceVector,

    /// Scalar force
    pub force: f32,

    /// Loud/calm verdict
    pub classification: Classification,

    /// Tempo peak detail
    pub tempo: TempoEstimate,

    /// Wall-clock time spent decoding and analyzing
    pub processing_time_ms: f32,
}
