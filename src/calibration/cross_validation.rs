//! k-fold cross-validation over pairs.
//!
//! Pairs (not entities) are shuffled once and dealt into folds by position.
//! Each fold calibrates on its training pairs only, then scores the held-out
//! pairs against raw co-occurrence.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};

use super::descent::{calibrate_pairs, complement, subset_spearman};
use crate::config::CalibrationConfig;
use crate::engine::Corpus;
use crate::outcome::Analysis;
use crate::stats::{mean, std_dev};
use crate::trials::run_trials;

/// Fold index for every pair: shuffled position mod k
pub fn fold_assignment(n_pairs: usize, k: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_pairs).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    let mut folds = vec![0; n_pairs];
    for (position, &pair) in order.iter().enumerate() {
        folds[pair] = position % k.max(1);
    }
    folds
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldResult {
    pub fold: usize,
    pub n_train: usize,
    pub n_test: usize,
    /// Held-out Spearman r under calibrated coordinates
    pub calibrated_r: Option<f64>,
    /// Held-out Spearman r under the original coordinates
    pub baseline_r: Option<f64>,
    pub final_loss: Option<f64>,
    /// Set when the fold did not produce a score
    pub skipped: Option<String>,
}

impl FoldResult {
    pub fn is_valid(&self) -> bool {
        self.calibrated_r.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidationReport {
    pub k: usize,
    pub seed: u64,
    pub n_pairs: usize,
    pub n_valid_folds: usize,
    pub mean_r: f64,
    pub std_r: f64,
    pub mean_baseline_r: f64,
    /// mean_r − mean_baseline_r; negative means calibration generalizes
    pub mean_improvement: f64,
    pub folds: Vec<FoldResult>,
}

pub fn cross_validate(
    corpus: &Corpus,
    k: usize,
    seed: u64,
    config: &CalibrationConfig,
) -> Analysis<CrossValidationReport> {
    let n = corpus.len();
    if k < 2 {
        return Analysis::invalid(format!("k = {} folds; need at least 2", k));
    }
    if k > n {
        return Analysis::invalid(format!("k = {} folds exceeds {} pairs", k, n));
    }

    let assignment = fold_assignment(n, k, seed);
    let original = corpus.archetype_coordinates();
    let weights = &config.axis_weights;

    let folds: Vec<FoldResult> = run_trials(k, config.parallel, |fold| {
        let test: Vec<usize> = (0..n).filter(|&i| assignment[i] == fold).collect();
        let train = complement(n, &test);
        let mut result = FoldResult {
            fold,
            n_train: train.len(),
            n_test: test.len(),
            calibrated_r: None,
            baseline_r: None,
            final_loss: None,
            skipped: None,
        };

        let run = match calibrate_pairs(corpus, &train, config) {
            Analysis::Success(run) => run,
            failure => {
                result.skipped = failure.reason().map(str::to_string);
                return result;
            }
        };
        result.final_loss = Some(run.summary.final_loss);
        result.baseline_r = subset_spearman(corpus, &original, weights, &test);
        result.calibrated_r = subset_spearman(corpus, &run.calibrated(), weights, &test);
        if result.calibrated_r.is_none() {
            result.skipped = Some("held-out pairs have no variance".to_string());
        }
        result
    });

    let valid: Vec<&FoldResult> = folds.iter().filter(|f| f.is_valid()).collect();
    if valid.is_empty() {
        warn!(k, "no cross-validation fold produced a score");
        return Analysis::degenerate("no fold produced a held-out correlation");
    }

    let rs: Vec<f64> = valid.iter().filter_map(|f| f.calibrated_r).collect();
    let baselines: Vec<f64> = valid.iter().filter_map(|f| f.baseline_r).collect();
    let mean_r = mean(&rs);
    let mean_baseline_r = mean(&baselines);

    info!(k, valid = rs.len(), mean_r, mean_baseline_r, "cross-validation complete");

    Analysis::Success(CrossValidationReport {
        k,
        seed,
        n_pairs: n,
        n_valid_folds: rs.len(),
        mean_r,
        std_r: std_dev(&rs),
        mean_baseline_r,
        mean_improvement: mean_r - mean_baseline_r,
        folds,
    })
}
