//! Silence trimming

/// Inclusive index range between the first and last non-zero samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    /// Index of the first non-zero sample
    pub start: usize,
    /// Index of the last non-zero sample
    pub end: usize,
}

impl SampleRange {
    /// Distance between the bounds, used as the normalization length
    ///
    /// A range holding a single sample has span 0.
    pub fn span(&self) -> usize {
        self.end - self.start
    }
}

/// Find the range left after trimming leading and trailing exact-zero samples
///
/// Returns `None` when every sample is zero.
pub fn nonzero_range(samples: &[i16]) -> Option<SampleRange> {
    let start = samples.iter().position(|&s| s != 0)?;
    let end = samples.iter().rposition(|&s| s != 0)?;
    log::trace!(
        "Trimmed {} leading and {} trailing zero samples",
        start,
        samples.len() - 1 - end
    );
    Some(SampleRange { start, end })
}
