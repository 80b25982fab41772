//! Data-driven axis weights: |per-axis r|, harmful axes forced to zero.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::axis::{axis_ablation, AblationReport};
use super::search::PairDistanceCache;
use crate::config::AnalysisConfig;
use crate::engine::{per_axis_correlation, Axis, AxisWeights, Corpus, N_AXES};
use crate::outcome::{try_analysis, Analysis};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalWeights {
    /// Sums to the number of active axes
    pub weights: AxisWeights,
    /// |r| per axis before zeroing, in axis order
    pub raw_strength: [f64; N_AXES],
    /// Exactly the axes the ablation marked harmful
    pub forced_zero: Vec<Axis>,
    pub active_axes: Vec<Axis>,
    pub r_uniform: f64,
    /// r of the weighted (optimized) model
    pub r_weighted: f64,
    /// r_weighted − r_uniform; negative is an improvement
    pub improvement: f64,
}

/// Derive weights, reusing an ablation already computed for the corpus
pub fn optimal_weights_from(
    corpus: &Corpus,
    ablation: &AblationReport,
    config: &AnalysisConfig,
) -> Analysis<OptimalWeights> {
    let per_axis = try_analysis!(per_axis_correlation(corpus, config.method));
    let raw_strength = per_axis.abs_by_axis();

    let mut w = raw_strength;
    for axis in &ablation.harmful {
        w[axis.index()] = 0.0;
    }
    let active: Vec<Axis> = Axis::ALL
        .iter()
        .copied()
        .filter(|a| w[a.index()] > 0.0)
        .collect();
    let total: f64 = w.iter().sum();
    if active.is_empty() || total <= 0.0 {
        return Analysis::degenerate("no axis carries a usable correlation");
    }
    let scale = active.len() as f64 / total;
    for v in w.iter_mut() {
        *v *= scale;
    }
    let weights = AxisWeights(w);

    let series = corpus.cooccurrence_series();
    let cache = PairDistanceCache::from_corpus(corpus);
    let all_axes: Vec<usize> = (0..N_AXES).collect();
    let Some(r_weighted) = series.correlate(&cache.distances(&weights.0, &all_axes), config.method)
    else {
        return Analysis::degenerate("weighted distances have no variance");
    };

    info!(
        r_uniform = ablation.r_full,
        r_weighted,
        zeroed = ablation.harmful.len(),
        "optimal weights derived"
    );

    Analysis::Success(OptimalWeights {
        weights,
        raw_strength,
        forced_zero: ablation.harmful.clone(),
        active_axes: active,
        r_uniform: ablation.r_full,
        r_weighted,
        improvement: r_weighted - ablation.r_full,
    })
}

pub fn optimal_weights(corpus: &Corpus, config: &AnalysisConfig) -> Analysis<OptimalWeights> {
    let ablation = try_analysis!(axis_ablation(corpus, config));
    optimal_weights_from(corpus, &ablation, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::planted_corpus;

    #[test]
    fn test_weights_sum_to_active_count() {
        let corpus = planted_corpus(14, 3);
        let config = AnalysisConfig::default();
        let result = optimal_weights(&corpus, &config).into_success().unwrap();
        let sum = result.weights.total();
        assert!((sum - result.active_axes.len() as f64).abs() < 1e-9);
        for axis in &result.forced_zero {
            assert_eq!(result.weights.get(*axis), 0.0);
        }
    }

    #[test]
    fn test_forced_zero_matches_ablation() {
        let corpus = planted_corpus(16, 9);
        let config = AnalysisConfig::default();
        let ablation = axis_ablation(&corpus, &config).into_success().unwrap();
        let result = optimal_weights(&corpus, &config).into_success().unwrap();
        assert_eq!(result.forced_zero, ablation.harmful);
        assert_eq!(result.r_uniform, ablation.r_full);
    }
}
