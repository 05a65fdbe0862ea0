//! Distance metrics for vector similarity

use serde::{Deserialize, Serialize};

use crate::{Result, VectorError};

/// Distance metrics for measuring vector similarity.
///
/// Every metric is expressed as a distance: lower values always mean more
/// similar vectors, so ranking and heap ordering never need to know which
/// metric is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Euclidean (L2) distance
    /// Range: [0, ∞], where 0 means identical vectors
    /// Best for: Image embeddings, when magnitude matters
    L2,

    /// Cosine distance (1 - cosine similarity)
    /// Range: [0, 2], where 0 means identical direction
    /// Best for: Text embeddings, normalized vectors
    Cosine,

    /// Negated dot product
    /// Range: (-∞, ∞), lower means larger inner product
    /// Best for: Maximum inner product search over unnormalized embeddings
    Dot,
}

impl Metric {
    /// Calculate the distance between two vectors under this metric.
    pub fn distance(&self, v1: &[f32], v2: &[f32]) -> f32 {
        debug_assert_eq!(v1.len(), v2.len(), "Vectors must have same dimension");

        match self {
            Metric::L2 => euclidean_distance(v1, v2),
            Metric::Cosine => cosine_distance(v1, v2),
            Metric::Dot => dot_distance(v1, v2),
        }
    }

    /// Single-byte tag used in the binary index format.
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            Metric::L2 => 0,
            Metric::Cosine => 1,
            Metric::Dot => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Metric::L2),
            1 => Ok(Metric::Cosine),
            2 => Ok(Metric::Dot),
            other => Err(VectorError::Deserialization(format!(
                "Unknown metric tag: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Metric::L2 => "l2",
            Metric::Cosine => "cosine",
            Metric::Dot => "dot",
        };
        write!(f, "{name}")
    }
}

/// Calculate Euclidean distance between two vectors
///
/// Returns the L2 norm of the difference between vectors.
#[inline]
pub fn euclidean_distance(v1: &[f32], v2: &[f32]) -> f32 {
    v1.iter()
        .zip(v2.iter())
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum::<f32>()
        .sqrt()
}

/// Calculate cosine distance (1 - cosine similarity) between two vectors
///
/// Returns a value in [0, 2] where:
/// - 0.0 means vectors point in the same direction
/// - 1.0 means vectors are orthogonal
/// - 2.0 means vectors point in opposite directions
///
/// A zero-norm input has no defined direction; the neutral distance 1.0 is
/// returned for it.
#[inline]
pub fn cosine_distance(v1: &[f32], v2: &[f32]) -> f32 {
    let dot = dot_product(v1, v2);
    let mag1 = magnitude(v1);
    let mag2 = magnitude(v2);

    if mag1 == 0.0 || mag2 == 0.0 {
        return 1.0;
    }

    // Clamp to [-1, 1] to absorb floating point error before subtracting
    let similarity = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    1.0 - similarity
}

/// Calculate negated dot product of two vectors
///
/// The index minimizes distance, so the inner product is negated: the vector
/// with the largest inner product sorts first.
#[inline]
pub fn dot_distance(v1: &[f32], v2: &[f32]) -> f32 {
    -dot_product(v1, v2)
}

/// Calculate dot product (inner product) of two vectors
#[inline]
pub fn dot_product(v1: &[f32], v2: &[f32]) -> f32 {
    v1.iter().zip(v2.iter()).map(|(a, b)| a * b).sum()
}

/// Calculate the magnitude (L2 norm) of a vector
#[inline]
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_cosine_distance_identical_direction() {
        let v1 = vec![1.0, 2.0, 3.0];
        let v2 = vec![1.0, 2.0, 3.0];
        let dist = cosine_distance(&v1, &v2);
        assert!(
            approx_eq(dist, 0.0),
            "Identical vectors should have distance 0.0"
        );
    }

    #[test]
    fn test_cosine_distance_scalar_multiple() {
        let v1 = vec![1.0, 0.0];
        let v2 = vec![10.0, 0.0];
        let dist = cosine_distance(&v1, &v2);
        assert!(
            approx_eq(dist, 0.0),
            "Positive scalar multiples should have distance 0.0"
        );
    }

    #[test]
    fn test_cosine_distance_orthogonal() {
        let v1 = vec![1.0, 0.0, 0.0];
        let v2 = vec![0.0, 1.0, 0.0];
        let dist = cosine_distance(&v1, &v2);
        assert!(
            approx_eq(dist, 1.0),
            "Orthogonal vectors should have distance 1.0"
        );
    }

    #[test]
    fn test_cosine_distance_opposite() {
        let v1 = vec![1.0, 2.0, 3.0];
        let v2 = vec![-1.0, -2.0, -3.0];
        let dist = cosine_distance(&v1, &v2);
        assert!(
            approx_eq(dist, 2.0),
            "Opposite vectors should have distance 2.0"
        );
    }

    #[test]
    fn test_cosine_distance_zero_vector() {
        let v1 = vec![0.0, 0.0, 0.0];
        let v2 = vec![1.0, 2.0, 3.0];
        let dist = cosine_distance(&v1, &v2);
        assert!(
            approx_eq(dist, 1.0),
            "Zero-norm input should yield the neutral distance 1.0"
        );
    }

    #[test]
    fn test_euclidean_distance_identical() {
        let v1 = vec![1.0, 2.0, 3.0];
        let v2 = vec![1.0, 2.0, 3.0];
        let dist = euclidean_distance(&v1, &v2);
        assert!(
            approx_eq(dist, 0.0),
            "Identical vectors should have distance 0.0"
        );
    }

    #[test]
    fn test_euclidean_distance() {
        let v1 = vec![0.0, 0.0, 0.0];
        let v2 = vec![3.0, 4.0, 0.0];
        let dist = euclidean_distance(&v1, &v2);
        assert!(
            approx_eq(dist, 5.0),
            "Distance should be 5.0 (3-4-5 triangle)"
        );
    }

    #[test]
    fn test_dot_product() {
        let v1 = vec![1.0, 2.0, 3.0];
        let v2 = vec![4.0, 5.0, 6.0];
        let dot = dot_product(&v1, &v2);
        // 1*4 + 2*5 + 3*6 = 4 + 10 + 18 = 32
        assert!(approx_eq(dot, 32.0));
    }

    #[test]
    fn test_dot_distance_reverses_inner_product_order() {
        let query = vec![1.0, 1.0];
        let small = vec![1.0, 1.0];
        let large = vec![3.0, 3.0];

        // Larger inner product must sort first, i.e. have smaller distance.
        assert!(dot_distance(&query, &large) < dot_distance(&query, &small));
    }

    #[test]
    fn test_magnitude() {
        let v = vec![3.0, 4.0, 0.0];
        let mag = magnitude(&v);
        assert!(approx_eq(mag, 5.0), "Magnitude should be 5.0");
    }

    #[test]
    fn test_metric_distance_dispatch() {
        let v1 = vec![1.0, 0.0, 0.0];
        let v2 = vec![0.0, 1.0, 0.0];

        let l2 = Metric::L2.distance(&v1, &v2);
        assert!(approx_eq(l2, 2.0_f32.sqrt()));

        let cosine = Metric::Cosine.distance(&v1, &v2);
        assert!(approx_eq(cosine, 1.0));

        let dot = Metric::Dot.distance(&v1, &v2);
        assert!(approx_eq(dot, 0.0));
    }

    #[test]
    fn test_metric_tag_round_trip() {
        for metric in [Metric::L2, Metric::Cosine, Metric::Dot] {
            assert_eq!(Metric::from_tag(metric.to_tag()).unwrap(), metric);
        }
        assert!(Metric::from_tag(3).is_err());
    }
}
