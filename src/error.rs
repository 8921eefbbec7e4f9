//! Error types for the mood analysis engine

use thiserror::Error;

/// Errors that can occur while decoding or analyzing a track
///
/// Decoding failures abort the whole analysis; no partial force vector is
/// ever returned alongside one of these.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// The file is missing or unreadable
    #[error("Cannot open file: {0}")]
    OpenFailure(String),

    /// The container holds no decodable audio stream
    #[error("No audio stream found: {0}")]
    StreamNotFound(String),

    /// The codec or resampler could not be opened or negotiated
    #[error("Codec failure: {0}")]
    CodecFailure(String),

    /// The sample buffer could not grow
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// A full decoding pass produced no samples
    #[error("Empty decode: {0}")]
    EmptyDecode(String),

    /// Silent or too-short input reached an analyzer
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// A computation produced a non-finite value
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Invalid parameters or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AnalysisError {
    /// Check that a rating is finite, naming the rating in the error
    pub(crate) fn ensure_finite(name: &str, value: f32) -> Result<f32, AnalysisError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(AnalysisError::NumericalError(format!(
                "{} rating is not finite ({})",
                name, value
            )))
        }
    }
}

impl From<std::collections::TryReserveError> for AnalysisError {
    fn from(err: std::collections::TryReserveError) -> Self {
        AnalysisError::AllocationFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AnalysisError::OpenFailure("/nope.flac".to_string());
        assert_eq!(err.to_string(), "Cannot open file: /nope.flac");

        let err = AnalysisError::DegenerateInput("silent".to_string());
        assert!(err.to_string().contains("silent"));
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(AnalysisError::ensure_finite("tempo", 1.5).unwrap(), 1.5);
        assert!(matches!(
            AnalysisError::ensure_finite("tempo", f32::NAN),
            Err(AnalysisError::NumericalError(_))
        ));
        assert!(matches!(
            AnalysisError::ensure_finite("frequency", f32::NEG_INFINITY),
            Err(AnalysisError::NumericalError(_))
        ));
    }
}
