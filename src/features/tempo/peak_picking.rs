//! Peak detection in magnitude spectra
//!
//! Finds local maxima that are strict against both neighbours, ranks them by
//! magnitude and keeps the strongest ones that are far enough from every
//! peak already kept.

/// Find up to `max_peaks` peaks of `signal` with indices in `range`
///
/// # Arguments
///
/// * `signal` - Values to search
/// * `range` - Inclusive index bounds; clamped so both neighbours exist
/// * `threshold` - Values at or below this are never peaks
/// * `min_distance` - Minimum index distance between two kept peaks
/// * `max_peaks` - Maximum number of peaks returned
///
/// # Returns
///
/// `(index, value)` pairs sorted by value, highest first
///
/// # Example
///
/// ```
/// use mood_dsp::features::tempo::peak_picking::find_peaks;
///
/// let signal = vec![0.0, 0.5, 1.0, 0.7, 0.3, 0.9, 0.2];
/// let peaks = find_peaks(&signal, 0..=6, 0.0, 2, 3);
/// assert_eq!(peaks, vec![(2, 1.0), (5, 0.9)]);
/// ```
pub fn find_peaks(
    signal: &[f64],
    range: std::ops::RangeInclusive<usize>,
    threshold: f64,
    min_distance: usize,
    max_peaks: usize,
) -> Vec<(usize, f64)> {
    if signal.len() < 3 || max_peaks == 0 {
        return vec![];
    }

    let first = (*range.start()).max(1);
    let last = (*range.end()).min(signal.len() - 2);
    if first > last {
        return vec![];
    }

    let mut candidates: Vec<(usize, f64)> = (first..=last)
        .filter(|&i| signal[i] > threshold)
        .filter(|&i| signal[i] > signal[i - 1] && signal[i] > signal[i + 1])
        .map(|i| (i, signal[i]))
        .collect();

    // Highest first; ties keep the lower index
    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let mut peaks: Vec<(usize, f64)> = Vec::with_capacity(max_peaks);
    for (idx, value) in candidates {
        let too_close = peaks
            .iter()
            .any(|&(kept, _)| idx.abs_diff(kept) < min_distance);
        if !too_close {
            peaks.push((idx, value));
            if peaks.len() == max_peaks {
                break;
            }
        }
    }

    log::trace!("Kept {} peaks in [{}, {}]", peaks.len(), first, last);
    peaks
}
