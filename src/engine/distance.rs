//! Pairwise distance in the 8-axis space.

use serde::{Deserialize, Serialize};

use super::coordinates::{Axis, AxisWeights, CoordinateVector, N_AXES};

/// Distance metric between coordinate vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Cosine,
}

/// Distance between two coordinate vectors.
///
/// Weighted Euclidean: `sqrt(Σ w_i·(v1_i − v2_i)²)` over `axes` (all axes when
/// `None`). Cosine: `1 − cos` on weighted components; a zero vector against a
/// non-zero one is 1.0, two zero vectors are 0.0.
pub fn distance(
    v1: &CoordinateVector,
    v2: &CoordinateVector,
    weights: Option<&AxisWeights>,
    axes: Option<&[Axis]>,
    metric: DistanceMetric,
) -> f64 {
    let a = v1.values();
    let b = v2.values();
    let weight = |k: usize| weights.map(|w| w.0[k]).unwrap_or(1.0);

    match metric {
        DistanceMetric::Euclidean => {
            let mut sum = 0.0;
            match axes {
                Some(selected) => {
                    let mut idx: Vec<usize> = selected.iter().map(|a| a.index()).collect();
                    idx.sort_unstable();
                    idx.dedup();
                    for k in idx {
                        let d = a[k] - b[k];
                        sum += weight(k) * (d * d);
                    }
                }
                None => {
                    for k in 0..N_AXES {
                        let d = a[k] - b[k];
                        sum += weight(k) * (d * d);
                    }
                }
            }
            sum.sqrt()
        }
        DistanceMetric::Cosine => {
            let indices: Vec<usize> = match axes {
                Some(selected) => {
                    let mut idx: Vec<usize> = selected.iter().map(|a| a.index()).collect();
                    idx.sort_unstable();
                    idx.dedup();
                    idx
                }
                None => (0..N_AXES).collect(),
            };
            let w = weights.map(|w| w.0).unwrap_or([1.0; N_AXES]);
            cosine_over(a, b, &w, &indices)
        }
    }
}

/// Weighted cosine distance `1 − cos` over sorted axis indices. A zero
/// vector against a non-zero one is 1.0, two zero vectors are 0.0.
pub fn cosine_over(a: &[f64; N_AXES], b: &[f64; N_AXES], weights: &[f64; N_AXES], axes: &[usize]) -> f64 {
    let (mut dot, mut na, mut nb) = (0.0, 0.0, 0.0);
    for &k in axes {
        let w = weights[k];
        dot += w * a[k] * b[k];
        na += w * a[k] * a[k];
        nb += w * b[k] * b[k];
    }
    if na <= 0.0 && nb <= 0.0 {
        0.0
    } else if na <= 0.0 || nb <= 0.0 {
        1.0
    } else {
        (1.0 - dot / (na.sqrt() * nb.sqrt())).clamp(0.0, 2.0)
    }
}

/// Per-axis squared differences, the cached unit of the subset search
pub fn squared_differences(v1: &CoordinateVector, v2: &CoordinateVector) -> [f64; N_AXES] {
    let a = v1.values();
    let b = v2.values();
    let mut out = [0.0; N_AXES];
    for k in 0..N_AXES {
        let d = a[k] - b[k];
        out[k] = d * d;
    }
    out
}

/// Weighted Euclidean distance from cached squared differences over sorted
/// axis indices. Arithmetic order matches [`distance`] exactly.
pub fn euclidean_from_squared(sq: &[f64; N_AXES], weights: &[f64; N_AXES], axes: &[usize]) -> f64 {
    let mut sum = 0.0;
    for &k in axes {
        sum += weights[k] * sq[k];
    }
    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: [f64; N_AXES]) -> CoordinateVector {
        CoordinateVector::new(values).unwrap()
    }

    #[test]
    fn test_euclidean_basic() {
        let a = v([0.0; N_AXES]);
        let b = v([1.0; N_AXES]);
        let d = distance(&a, &b, None, None, DistanceMetric::Euclidean);
        assert!((d - 8f64.sqrt()).abs() < 1e-12);
        assert_eq!(distance(&a, &a, None, None, DistanceMetric::Euclidean), 0.0);
    }

    #[test]
    fn test_weighted_and_subset() {
        let a = v([0.0; N_AXES]);
        let mut bv = [0.0; N_AXES];
        bv[0] = 1.0;
        bv[1] = 1.0;
        let b = v(bv);

        let mut w = AxisWeights::uniform();
        w.0[0] = 4.0;
        let d = distance(&a, &b, Some(&w), None, DistanceMetric::Euclidean);
        assert!((d - 5f64.sqrt()).abs() < 1e-12);

        let d = distance(
            &a,
            &b,
            None,
            Some(&[Axis::CreationDestruction]),
            DistanceMetric::Euclidean,
        );
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine() {
        let a = v([0.5; N_AXES]);
        let b = v([1.0; N_AXES]);
        assert!(distance(&a, &b, None, None, DistanceMetric::Cosine).abs() < 1e-12);

        let zero = v([0.0; N_AXES]);
        assert_eq!(distance(&zero, &b, None, None, DistanceMetric::Cosine), 1.0);
        assert_eq!(distance(&zero, &zero, None, None, DistanceMetric::Cosine), 0.0);
    }

    #[test]
    fn test_cached_matches_direct() {
        let a = v([0.1, 0.9, 0.3, 0.7, 0.2, 0.4, 0.6, 0.8]);
        let b = v([0.8, 0.2, 0.5, 0.1, 0.9, 0.3, 0.35, 0.05]);
        let sq = squared_differences(&a, &b);
        let all: Vec<usize> = (0..N_AXES).collect();
        let direct = distance(&a, &b, None, None, DistanceMetric::Euclidean);
        assert_eq!(euclidean_from_squared(&sq, &[1.0; N_AXES], &all), direct);
    }

    #[test]
    fn test_cosine_over_matches_direct() {
        let a = v([0.1, 0.9, 0.3, 0.7, 0.2, 0.4, 0.6, 0.8]);
        let b = v([0.8, 0.2, 0.5, 0.1, 0.9, 0.3, 0.35, 0.05]);
        let all: Vec<usize> = (0..N_AXES).collect();
        let direct = distance(&a, &b, None, None, DistanceMetric::Cosine);
        assert_eq!(cosine_over(a.values(), b.values(), &[1.0; N_AXES], &all), direct);

        let mut w = AxisWeights::uniform();
        w.0[3] = 0.0;
        let subset = [Axis::from_index(0).unwrap(), Axis::from_index(6).unwrap()];
        assert_eq!(
            cosine_over(a.values(), b.values(), &w.0, &[0, 6]),
            distance(&a, &b, Some(&w), Some(&subset), DistanceMetric::Cosine)
        );
    }
}
