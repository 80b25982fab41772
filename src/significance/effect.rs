//! Effect size for the distance ↔ co-occurrence correlation.

use serde::{Deserialize, Serialize};

use crate::engine::{correlate_series, Corpus};
use crate::outcome::{try_analysis, Analysis, MIN_PAIRS};
use crate::stats::{fisher_z, CorrelationMethod};

/// z for a two-sided 95% interval
const Z_95: f64 = 1.959_963_984_540_054;

/// Conventional magnitude bands on |r|
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl Magnitude {
    /// |r| < 0.1 negligible, < 0.3 small, < 0.5 medium, otherwise large
    pub fn classify(r: f64) -> Self {
        let a = r.abs();
        if a < 0.1 {
            Magnitude::Negligible
        } else if a < 0.3 {
            Magnitude::Small
        } else if a < 0.5 {
            Magnitude::Medium
        } else {
            Magnitude::Large
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub method: CorrelationMethod,
    pub n_pairs: usize,
    pub r: f64,
    pub r_squared: f64,
    pub fisher_z: f64,
    /// Cohen's q against r = 0
    pub cohens_q: f64,
    /// 95% Fisher-z interval for r
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub magnitude: Magnitude,
}

impl EffectSize {
    /// Effect size statistics for a correlation r over n pairs (n > 3)
    pub fn from_r(r: f64, n: usize, method: CorrelationMethod) -> Self {
        let z = fisher_z(r);
        let se = 1.0 / ((n as f64 - 3.0).max(1.0)).sqrt();
        Self {
            method,
            n_pairs: n,
            r,
            r_squared: r * r,
            fisher_z: z,
            cohens_q: (z - fisher_z(0.0)).abs(),
            ci_lower: (z - Z_95 * se).tanh(),
            ci_upper: (z + Z_95 * se).tanh(),
            magnitude: Magnitude::classify(r),
        }
    }
}

/// Spearman effect size for the corpus
pub fn effect_size(corpus: &Corpus) -> Analysis<EffectSize> {
    effect_size_with(corpus, CorrelationMethod::Spearman)
}

pub fn effect_size_with(corpus: &Corpus, method: CorrelationMethod) -> Analysis<EffectSize> {
    let n = corpus.len();
    if n < MIN_PAIRS {
        return Analysis::insufficient_pairs(n);
    }
    let r = try_analysis!(correlate_series(
        &corpus.distances(),
        &corpus.cooccurrence_series(),
        method
    ));
    Analysis::Success(EffectSize::from_r(r, n, method))
}
