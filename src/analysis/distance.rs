//! Distance and similarity between force vectors

use crate::analysis::result::ForceVector;

/// Euclidean distance over the four components
pub fn distance(v1: &ForceVector, v2: &ForceVector) -> f32 {
    v1.as_array()
        .iter()
        .zip(v2.as_array().iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

/// Cosine similarity, clamped to `[-1, 1]`
///
/// Returns `None` when either vector is zero, where the angle is undefined.
///
/// # Example
///
/// ```
/// use mood_dsp::{cosine_similarity, ForceVector};
///
/// let v = ForceVector { tempo: 1.0, amplitude: -2.0, frequency: 0.5, attack: 3.0 };
/// assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&v, &ForceVector::default()), None);
/// ```
pub fn cosine_similarity(v1: &ForceVector, v2: &ForceVector) -> Option<f32> {
    let a = v1.as_array();
    let b = v2.as_array();

    // Accumulate in f64
    let dot: f64 = a.iter().zip(&b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some((dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_known_value() {
        let a = ForceVector::from_array([1.0, 2.0, 3.0, 4.0]);
        let b = ForceVector::from_array([2.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(distance(&a, &b), 1.0);

        let c = ForceVector::from_array([0.0, 0.0, 0.0, 0.0]);
        let d = ForceVector::from_array([3.0, 4.0, 0.0, 0.0]);
        assert_relative_eq!(distance(&c, &d), 5.0);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        let x = ForceVector::from_array([1.0, 0.0, 0.0, 0.0]);
        let y = ForceVector::from_array([0.0, 1.0, 0.0, 0.0]);
        assert_relative_eq!(cosine_similarity(&x, &y).unwrap(), 0.0);

        let neg = ForceVector::from_array([-2.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(cosine_similarity(&x, &neg).unwrap(), -1.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let zero = ForceVector::default();
        let x = ForceVector::from_array([1.0, 0.0, 0.0, 0.0]);
        assert_eq!(cosine_similarity(&zero, &x), None);
        assert_eq!(cosine_similarity(&x, &zero), None);
        assert_eq!(cosine_similarity(&zero, &zero), None);
    }
}
