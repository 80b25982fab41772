//! Exhaustive axis-subset search.
//!
//! Per-pair distance terms and co-occurrence ranks are computed once; every
//! subset only re-sums cached terms under the corpus metric, so the 8-axis
//! subset reproduces the full-model correlation bit for bit.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{
    cosine_over, euclidean_from_squared, squared_differences, Axis, Corpus, DistanceMetric, N_AXES,
};
use crate::outcome::{Analysis, MIN_PAIRS};
use crate::stats::{float_cmp, CorrelationMethod, FixedSeries};

#[derive(Debug, Clone)]
enum PairTerms {
    /// Per-axis squared coordinate differences
    Euclidean(Vec<[f64; N_AXES]>),
    /// Both coordinate vectors of each pair
    Cosine(Vec<([f64; N_AXES], [f64; N_AXES])>),
}

/// Cached per-pair distance terms for re-weighting and axis subsets
#[derive(Debug, Clone)]
pub struct PairDistanceCache {
    terms: PairTerms,
}

impl PairDistanceCache {
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let coords = corpus.entity_coordinates();
        let pairs = corpus.pairs();
        let terms = match corpus.metric() {
            DistanceMetric::Euclidean => PairTerms::Euclidean(
                pairs
                    .iter()
                    .map(|p| squared_differences(&coords[p.entity_a], &coords[p.entity_b]))
                    .collect(),
            ),
            DistanceMetric::Cosine => PairTerms::Cosine(
                pairs
                    .iter()
                    .map(|p| (*coords[p.entity_a].values(), *coords[p.entity_b].values()))
                    .collect(),
            ),
        };
        Self { terms }
    }

    pub fn metric(&self) -> DistanceMetric {
        match self.terms {
            PairTerms::Euclidean(_) => DistanceMetric::Euclidean,
            PairTerms::Cosine(_) => DistanceMetric::Cosine,
        }
    }

    /// Weighted distances over sorted axis indices
    pub fn distances(&self, weights: &[f64; N_AXES], axes: &[usize]) -> Vec<f64> {
        match &self.terms {
            PairTerms::Euclidean(rows) => rows
                .iter()
                .map(|sq| euclidean_from_squared(sq, weights, axes))
                .collect(),
            PairTerms::Cosine(rows) => rows
                .iter()
                .map(|(a, b)| cosine_over(a, b, weights, axes))
                .collect(),
        }
    }
}

/// All k-subsets of `0..n` in lexicographic order
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        // rightmost position that can still advance
        let Some(i) = (0..k).rev().find(|&i| idx[i] < n - k + i) else {
            return out;
        };
        idx[i] += 1;
        for j in (i + 1)..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetResult {
    pub axes: Vec<Axis>,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionResult {
    pub dims: usize,
    pub n_subsets: usize,
    pub n_degenerate: usize,
    /// Most negative r at this dimensionality
    pub best: Option<SubsetResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub method: CorrelationMethod,
    pub min_dims: usize,
    pub max_dims: usize,
    pub n_subsets: usize,
    pub by_dimension: Vec<DimensionResult>,
    pub best: Option<SubsetResult>,
    /// Ranked by r ascending
    pub top: Vec<SubsetResult>,
}

/// Progress after one dimensionality completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProgress {
    pub dims: usize,
    pub subsets_done: usize,
    pub subsets_total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub min_dims: usize,
    pub max_dims: usize,
    pub top_n: usize,
    pub method: CorrelationMethod,
    pub parallel: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_dims: 3,
            max_dims: 7,
            top_n: 10,
            method: CorrelationMethod::Spearman,
            parallel: false,
        }
    }
}

/// Search every subset with `min_dims..=max_dims` axes (Spearman, top 10)
pub fn dimensionality_search(corpus: &Corpus, min_dims: usize, max_dims: usize) -> Analysis<SearchReport> {
    let options = SearchOptions {
        min_dims,
        max_dims,
        ..SearchOptions::default()
    };
    dimensionality_search_with(corpus, &options, None)
}

pub fn dimensionality_search_with(
    corpus: &Corpus,
    options: &SearchOptions,
    mut progress: Option<&mut dyn FnMut(SearchProgress)>,
) -> Analysis<SearchReport> {
    let (min_dims, max_dims) = (options.min_dims, options.max_dims);
    if min_dims == 0 || min_dims > max_dims || max_dims > N_AXES {
        return Analysis::invalid(format!(
            "dimension bounds {}..={} outside 1..={}",
            min_dims, max_dims, N_AXES
        ));
    }
    if corpus.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(corpus.len());
    }
    let series: FixedSeries = corpus.cooccurrence_series();
    if series.is_degenerate() {
        return Analysis::degenerate("all co-occurrence counts are identical");
    }

    let cache = PairDistanceCache::from_corpus(corpus);
    debug!(metric = ?cache.metric(), pairs = corpus.len(), "pair distance terms cached");
    let ones = [1.0; N_AXES];
    let subsets_total: usize = (min_dims..=max_dims).map(|k| combinations(N_AXES, k).len()).sum();

    let mut by_dimension = Vec::new();
    let mut all: Vec<SubsetResult> = Vec::new();
    let mut subsets_done = 0;

    for k in min_dims..=max_dims {
        let subsets = combinations(N_AXES, k);
        let score = |axes: &Vec<usize>| series.correlate(&cache.distances(&ones, axes), options.method);
        let scores: Vec<Option<f64>> = if options.parallel {
            subsets.par_iter().map(score).collect()
        } else {
            subsets.iter().map(score).collect()
        };

        let mut defined: Vec<SubsetResult> = subsets
            .iter()
            .zip(&scores)
            .filter_map(|(axes, r)| {
                r.map(|r| SubsetResult {
                    axes: axes.iter().filter_map(|&i| Axis::from_index(i)).collect(),
                    r,
                })
            })
            .collect();
        let n_degenerate = subsets.len() - defined.len();
        let best = defined.iter().min_by(|a, b| float_cmp(&a.r, &b.r)).cloned();
        debug!(dims = k, subsets = subsets.len(), n_degenerate, "dimensionality evaluated");

        subsets_done += subsets.len();
        by_dimension.push(DimensionResult {
            dims: k,
            n_subsets: subsets.len(),
            n_degenerate,
            best,
        });
        all.append(&mut defined);

        if let Some(callback) = progress.as_deref_mut() {
            callback(SearchProgress {
                dims: k,
                subsets_done,
                subsets_total,
            });
        }
    }

    // stable sort keeps enumeration order among ties
    all.sort_by(|a, b| float_cmp(&a.r, &b.r));
    let best = all.first().cloned();
    all.truncate(options.top_n);

    if let Some(b) = &best {
        info!(r = b.r, dims = b.axes.len(), "best axis subset");
    }

    Analysis::Success(SearchReport {
        method: options.method,
        min_dims,
        max_dims,
        n_subsets: subsets_total,
        by_dimension,
        best,
        top: all,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ablation::axis_ablation;
    use crate::config::AnalysisConfig;
    use crate::engine::correlate;
    use crate::synthetic::{planted_corpus, planted_snapshot};

    #[test]
    fn test_combination_counts() {
        let total: usize = (3..=7).map(|k| combinations(8, k).len()).sum();
        assert_eq!(total, 218);
        assert_eq!(combinations(8, 8), vec![(0..8).collect::<Vec<_>>()]);
        assert_eq!(combinations(4, 2)[..3], [vec![0, 1], vec![0, 2], vec![0, 3]]);
        assert!(combinations(3, 4).is_empty());
    }

    #[test]
    fn test_full_subset_reproduces_correlate() {
        let corpus = planted_corpus(12, 5);
        let report = dimensionality_search(&corpus, 8, 8).into_success().unwrap();
        let full = correlate(&corpus).into_success().unwrap();
        let best = report.best.unwrap();
        assert_eq!(best.axes.len(), 8);
        assert_eq!(best.r.to_bits(), full.spearman_r.to_bits());
    }

    #[test]
    fn test_cosine_full_subset_reproduces_correlate() {
        let corpus = planted_snapshot(20, 7)
            .build_corpus(DistanceMetric::Cosine)
            .into_success()
            .unwrap();
        assert_eq!(PairDistanceCache::from_corpus(&corpus).metric(), DistanceMetric::Cosine);
        let full = correlate(&corpus).into_success().unwrap();

        let report = dimensionality_search(&corpus, 8, 8).into_success().unwrap();
        let best = report.best.unwrap();
        assert_eq!(best.r.to_bits(), full.spearman_r.to_bits());

        let ablation = axis_ablation(&corpus, &AnalysisConfig::default())
            .into_success()
            .unwrap();
        assert_eq!(ablation.r_full.to_bits(), full.spearman_r.to_bits());
    }

    #[test]
    fn test_progress_fires_per_dimensionality() {
        let corpus = planted_corpus(10, 5);
        let mut seen = Vec::new();
        let mut record = |p: SearchProgress| seen.push(p);
        let callback: &mut dyn FnMut(SearchProgress) = &mut record;
        let options = SearchOptions {
            parallel: true,
            ..SearchOptions::default()
        };
        let report = dimensionality_search_with(&corpus, &options, Some(callback))
            .into_success()
            .unwrap();
        assert_eq!(seen.len(), 5);
        assert_eq!(seen.last().unwrap().subsets_done, 218);
        assert_eq!(report.n_subsets, 218);
        assert_eq!(report.top.len(), 10);
        assert!(report.top.windows(2).all(|w| w[0].r <= w[1].r));
    }

    #[test]
    fn test_bad_bounds() {
        let corpus = planted_corpus(10, 5);
        assert_eq!(dimensionality_search(&corpus, 0, 3).kind(), "invalid");
        assert_eq!(dimensionality_search(&corpus, 5, 4).kind(), "invalid");
        assert_eq!(dimensionality_search(&corpus, 2, 9).kind(), "invalid");
    }
}
