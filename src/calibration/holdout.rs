//! Leave-one-tradition-out generalization.
//!
//! Calibration sees only pairs with no endpoint in the held-out tradition;
//! the score is taken on pairs with both endpoints inside it. Archetypes
//! shared across traditions carry what was learned.

use serde::Serialize;
use tracing::{debug, info};

use super::descent::{calibrate_pairs, subset_spearman};
use crate::config::CalibrationConfig;
use crate::engine::Corpus;
use crate::outcome::{try_analysis, Analysis, MIN_PAIRS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldoutReport {
    pub tradition: String,
    pub n_train: usize,
    pub n_test: usize,
    pub calibrated_r: f64,
    pub baseline_r: f64,
    /// calibrated_r − baseline_r; negative means the calibration transferred
    pub improvement: f64,
    pub steps: usize,
    pub final_loss: f64,
}

pub fn holdout_tradition(
    corpus: &Corpus,
    label: &str,
    config: &CalibrationConfig,
) -> Analysis<HoldoutReport> {
    if !corpus.traditions().iter().any(|t| t == label) {
        return Analysis::invalid(format!("unknown tradition '{}'", label));
    }

    let test = corpus.pairs_within_tradition(label);
    if test.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(test.len());
    }
    let train = corpus.pairs_outside_tradition(label);
    let run = try_analysis!(calibrate_pairs(corpus, &train, config));

    let weights = &config.axis_weights;
    let baseline = subset_spearman(corpus, &corpus.archetype_coordinates(), weights, &test);
    let calibrated = subset_spearman(corpus, &run.calibrated(), weights, &test);
    let (Some(baseline_r), Some(calibrated_r)) = (baseline, calibrated) else {
        return Analysis::degenerate("held-out tradition pairs have no variance");
    };

    debug!(tradition = label, baseline_r, calibrated_r, "holdout scored");

    Analysis::Success(HoldoutReport {
        tradition: label.to_string(),
        n_train: train.len(),
        n_test: test.len(),
        calibrated_r,
        baseline_r,
        improvement: calibrated_r - baseline_r,
        steps: run.summary.steps,
        final_loss: run.summary.final_loss,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldoutSweep {
    pub results: Vec<HoldoutReport>,
    /// Traditions with fewer than 10 internal pairs, or whose run failed
    pub skipped: Vec<(String, String)>,
    /// Mean improvement over scored traditions
    pub mean_improvement: Option<f64>,
}

/// Hold out each tradition in turn
pub fn holdout_all_traditions(corpus: &Corpus, config: &CalibrationConfig) -> HoldoutSweep {
    let mut results = Vec::new();
    let mut skipped = Vec::new();

    for label in corpus.traditions() {
        match holdout_tradition(corpus, label, config) {
            Analysis::Success(report) => results.push(report),
            failure => skipped.push((
                label.clone(),
                failure.reason().unwrap_or_default().to_string(),
            )),
        }
    }

    let mean_improvement = if results.is_empty() {
        None
    } else {
        Some(results.iter().map(|r| r.improvement).sum::<f64>() / results.len() as f64)
    };
    info!(scored = results.len(), skipped = skipped.len(), "holdout sweep complete");

    HoldoutSweep {
        results,
        skipped,
        mean_improvement,
    }
}
