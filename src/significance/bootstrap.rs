//! Percentile bootstrap over pairs.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Corpus;
use crate::outcome::{Analysis, MIN_PAIRS};
use crate::stats::{float_cmp, pearson, percentile_sorted, spearman};
use crate::trials::{run_trials, trial_rng};

/// Percentile interval for one statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapInterval {
    /// Statistic on the full sample
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
    pub n_valid: usize,
    pub n_degenerate: usize,
}

impl BootstrapInterval {
    /// Interval lies entirely below zero
    pub fn excludes_zero_negative(&self) -> bool {
        self.upper < 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapReport {
    pub n_resamples: usize,
    pub confidence: f64,
    pub seed: u64,
    pub spearman: BootstrapInterval,
    pub pearson: BootstrapInterval,
}

pub fn bootstrap_ci(
    corpus: &Corpus,
    n_resamples: usize,
    confidence: f64,
    seed: u64,
) -> Analysis<BootstrapReport> {
    bootstrap_ci_with(corpus, n_resamples, confidence, seed, false)
}

pub fn bootstrap_ci_with(
    corpus: &Corpus,
    n_resamples: usize,
    confidence: f64,
    seed: u64,
    parallel: bool,
) -> Analysis<BootstrapReport> {
    let n = corpus.len();
    if n < MIN_PAIRS {
        return Analysis::insufficient_pairs(n);
    }
    if n_resamples == 0 {
        return Analysis::invalid("n_resamples must be > 0");
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Analysis::invalid("confidence must be in (0, 1)");
    }

    let distances = corpus.distances();
    let cooc = corpus.cooccurrences();
    let (Some(spearman_full), Some(pearson_full)) =
        (spearman(&distances, &cooc), pearson(&distances, &cooc))
    else {
        return Analysis::degenerate("distance or co-occurrence array has no variance");
    };

    let resamples: Vec<(Option<f64>, Option<f64>)> = run_trials(n_resamples, parallel, |t| {
        let mut rng = trial_rng(seed, t);
        let (mut d, mut c) = (Vec::with_capacity(n), Vec::with_capacity(n));
        for _ in 0..n {
            let i = rng.gen_range(0..n);
            d.push(distances[i]);
            c.push(cooc[i]);
        }
        (spearman(&d, &c), pearson(&d, &c))
    });

    let tail = (1.0 - confidence) / 2.0 * 100.0;
    let interval = |estimate: f64, values: Vec<Option<f64>>| -> Option<BootstrapInterval> {
        let n_total = values.len();
        let mut valid: Vec<f64> = values.into_iter().flatten().collect();
        if valid.is_empty() {
            return None;
        }
        valid.sort_by(float_cmp);
        Some(BootstrapInterval {
            estimate,
            lower: percentile_sorted(&valid, tail),
            upper: percentile_sorted(&valid, 100.0 - tail),
            n_valid: valid.len(),
            n_degenerate: n_total - valid.len(),
        })
    };

    let (s, p): (Vec<Option<f64>>, Vec<Option<f64>>) = resamples.into_iter().unzip();
    let (Some(spearman_ci), Some(pearson_ci)) = (interval(spearman_full, s), interval(pearson_full, p))
    else {
        return Analysis::degenerate("every bootstrap resample was degenerate");
    };

    debug!(
        lower = spearman_ci.lower,
        upper = spearman_ci.upper,
        skipped = spearman_ci.n_degenerate,
        "bootstrap interval computed"
    );

    Analysis::Success(BootstrapReport {
        n_resamples,
        confidence,
        seed,
        spearman: spearman_ci,
        pearson: pearson_ci,
    })
}
