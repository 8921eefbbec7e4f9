//! Window functions

use std::f64::consts::PI;

/// Symmetric Hann window: `w[i] = 0.5 * (1 - cos(2πi / (len - 1)))`
pub fn hann(len: usize) -> Vec<f32> {
    if len < 2 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| (0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos())) as f32)
        .collect()
}

/// Symmetric Hamming window, used for FIR design
pub fn hamming(len: usize) -> Vec<f64> {
    if len < 2 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_hann_shape() {
        let w = hann(512);
        assert_eq!(w.len(), 512);
        assert_abs_diff_eq!(w[0], 0.0);
        assert_abs_diff_eq!(w[511], 0.0, epsilon = 1e-7);
        // Symmetric, peak in the middle
        assert_abs_diff_eq!(w[100], w[411], epsilon = 1e-6);
        assert!(w[255] > 0.99 && w[256] > 0.99);
    }

    #[test]
    fn test_hamming_endpoints() {
        let w = hamming(33);
        assert_abs_diff_eq!(w[0], 0.08, epsilon = 1e-12);
        assert_abs_diff_eq!(w[16], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(hann(0).is_empty());
        assert_eq!(hann(1), vec![1.0]);
    }
}
