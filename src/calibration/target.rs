//! Co-occurrence → target distance.
//!
//! `t = 1 − log1p(c) / max log1p(c)`: the most frequent pair sits at 0, pairs
//! never seen together at 1.

/// Target distances for a co-occurrence column; all 1.0 when every count is 0
pub fn target_distances(cooccurrence: &[f64]) -> Vec<f64> {
    let max_log = cooccurrence
        .iter()
        .map(|c| c.max(0.0).ln_1p())
        .fold(0.0_f64, f64::max);
    cooccurrence
        .iter()
        .map(|&c| target_distance(c, max_log))
        .collect()
}

/// Target for one count given the column's maximum `log1p`
pub fn target_distance(count: f64, max_log: f64) -> f64 {
    if max_log <= 0.0 {
        return 1.0;
    }
    1.0 - count.max(0.0).ln_1p() / max_log
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        let t = target_distances(&[0.0, 9.0, 99.0]);
        assert_eq!(t[0], 1.0);
        assert_eq!(t[2], 0.0);
        assert!((t[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_counts() {
        assert_eq!(target_distances(&[0.0, 0.0]), vec![1.0, 1.0]);
        assert!(target_distances(&[]).is_empty());
    }
}
