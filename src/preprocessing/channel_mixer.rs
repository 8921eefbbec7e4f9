//! Channel down-mixing

/// Average interleaved `i16` frames into one mono `f32` channel
///
/// # Arguments
///
/// * `samples` - Interleaved samples
/// * `channels` - Samples per frame; 0 and 1 pass samples through
///
/// # Returns
///
/// One value per whole frame, still in the integer sample scale (no
/// division by 32768). A trailing partial frame is ignored.
///
/// # Example
///
/// ```
/// use mood_dsp::preprocessing::channel_mixer::downmix_to_mono;
///
/// assert_eq!(downmix_to_mono(&[100, 200, -50, 50, 7], 2), vec![150.0, 0.0]);
/// ```
pub fn downmix_to_mono(samples: &[i16], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.iter().map(|&s| s as f32).collect();
    }

    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().map(|&s| s as f32).sum::<f32>() * scale)
        .collect()
}
