//! Per-tradition correlation with multiple-comparison correction.

use serde::Serialize;
use tracing::debug;

use super::correction::{benjamini_hochberg, bonferroni, CorrectionReport};
use crate::config::AnalysisConfig;
use crate::engine::{correlate_series, Corpus};
use crate::outcome::{Analysis, MIN_PAIRS};
use crate::stats::correlation_p_value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraditionResult {
    pub tradition: String,
    pub n_pairs: usize,
    pub r: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTradition {
    pub tradition: String,
    pub n_pairs: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraditionReport {
    pub tested: Vec<TraditionResult>,
    pub skipped: Vec<SkippedTradition>,
    pub bonferroni: Analysis<CorrectionReport>,
    pub benjamini_hochberg: Analysis<CorrectionReport>,
}

/// Correlate within every tradition (pairs whose endpoints share it) and
/// correct the resulting family of p-values.
pub fn tradition_significance(corpus: &Corpus, config: &AnalysisConfig) -> TraditionReport {
    let mut tested = Vec::new();
    let mut skipped = Vec::new();

    for label in corpus.traditions() {
        let indices = corpus.pairs_within_tradition(label);
        if indices.len() < MIN_PAIRS {
            skipped.push(SkippedTradition {
                tradition: label.clone(),
                n_pairs: indices.len(),
                reason: crate::outcome::INSUFFICIENT_PAIRS.to_string(),
            });
            continue;
        }
        let group = corpus.with_pairs(&indices);
        match correlate_series(&group.distances(), &group.cooccurrence_series(), config.method) {
            Analysis::Success(r) => tested.push(TraditionResult {
                tradition: label.clone(),
                n_pairs: group.len(),
                r,
                p_value: correlation_p_value(r, group.len()),
            }),
            failure => skipped.push(SkippedTradition {
                tradition: label.clone(),
                n_pairs: group.len(),
                reason: failure.reason().unwrap_or_default().to_string(),
            }),
        }
    }

    debug!(tested = tested.len(), skipped = skipped.len(), "tradition correlations");

    let family: Vec<(&str, f64)> = tested
        .iter()
        .map(|t| (t.tradition.as_str(), t.p_value))
        .collect();
    let alpha = config.criteria.alpha;

    TraditionReport {
        bonferroni: bonferroni(&family, alpha),
        benjamini_hochberg: benjamini_hochberg(&family, alpha),
        tested,
        skipped,
    }
}
