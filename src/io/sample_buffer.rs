//! Growable canonical PCM buffer

use crate::error::AnalysisError;

/// Owned buffer of interleaved signed 16-bit samples
///
/// The buffer is pre-sized from a duration estimate and then grows by
/// exactly the overflow of each append; it never shrinks and never
/// over-allocates by doubling. `len()` is the true decoded sample count,
/// which may differ from the initial estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcmBuffer {
    /// Sample data
    data: Vec<i16>,
}

impl PcmBuffer {
    /// Create a buffer able to hold `estimate` samples without reallocating
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailure` if the estimate cannot be reserved.
    pub fn with_estimate(estimate: usize) -> Result<Self, AnalysisError> {
        let mut data = Vec::new();
        data.try_reserve_exact(estimate)?;
        Ok(Self { data })
    }

    /// Append samples, growing the allocation by exactly the overflow
    ///
    /// Growth and copy happen as one step: on allocation failure the buffer
    /// is left untouched.
    pub fn append(&mut self, samples: &[i16]) -> Result<(), AnalysisError> {
        let needed = self.data.len() + samples.len();
        if needed > self.data.capacity() {
            let overflow = needed - self.data.capacity();
            log::trace!(
                "Growing PCM buffer by {} samples (capacity {} -> {})",
                overflow,
                self.data.capacity(),
                needed
            );
            // try_reserve_exact counts from len, not capacity
            self.data.try_reserve_exact(needed - self.data.len())?;
        }
        self.data.extend_from_slice(samples);
        Ok(())
    }

    /// Number of samples written so far (all channels)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no sample has been written
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Allocated capacity in samples
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Read-only view of the samples
    pub fn samples(&self) -> &[i16] {
        &self.data
    }

    /// Canonical little-endian byte image of the buffer
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}
