//! Noise sensitivity: does the sign of r survive small coordinate errors?

use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::VerdictCriteria;
use crate::engine::{correlate_series, CoordinateVector, Corpus, N_AXES};
use crate::outcome::{try_analysis, Analysis, MIN_PAIRS};
use crate::stats::{CorrelationMethod, NullDistribution};
use crate::trials::{run_trials, trial_rng};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub method: CorrelationMethod,
    pub sigma: f64,
    pub n_trials: usize,
    pub seed: u64,
    pub observed_r: f64,
    /// Trials keeping the observed sign with |r| ≥ sign_margin
    pub n_preserved: usize,
    /// n_preserved / n_trials (degenerate trials count as not preserved)
    pub robustness: f64,
    pub robust: bool,
    pub sign_margin: f64,
    pub robust_threshold: f64,
    pub distribution: NullDistribution,
}

/// Spearman sensitivity with default thresholds, serial dispatch
pub fn coordinate_sensitivity(
    corpus: &Corpus,
    sigma: f64,
    n_trials: usize,
    seed: u64,
) -> Analysis<SensitivityReport> {
    coordinate_sensitivity_with(
        corpus,
        sigma,
        n_trials,
        seed,
        CorrelationMethod::Spearman,
        &VerdictCriteria::default(),
        false,
    )
}

/// Gaussian noise on every archetype coordinate, clipped to [0,1], per trial
pub fn coordinate_sensitivity_with(
    corpus: &Corpus,
    sigma: f64,
    n_trials: usize,
    seed: u64,
    method: CorrelationMethod,
    criteria: &VerdictCriteria,
    parallel: bool,
) -> Analysis<SensitivityReport> {
    if corpus.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(corpus.len());
    }
    if n_trials == 0 {
        return Analysis::invalid("n_trials must be > 0");
    }
    if !(sigma >= 0.0 && sigma.is_finite()) {
        return Analysis::invalid(format!("sigma {} must be finite and >= 0", sigma));
    }
    let Ok(noise) = Normal::new(0.0, sigma) else {
        return Analysis::invalid(format!("sigma {} is not a valid standard deviation", sigma));
    };

    let series = corpus.cooccurrence_series();
    let observed = try_analysis!(correlate_series(&corpus.distances(), &series, method));
    let base = corpus.archetype_coordinates();
    let metric = corpus.metric();

    let trials: Vec<Option<f64>> = run_trials(n_trials, parallel, |t| {
        let mut rng = trial_rng(seed, t);
        let noisy: Vec<CoordinateVector> = base
            .iter()
            .map(|c| {
                let mut v = [0.0; N_AXES];
                for (k, x) in c.values().iter().enumerate() {
                    v[k] = (x + noise.sample(&mut rng)).clamp(0.0, 1.0);
                }
                CoordinateVector::clamped(v)
            })
            .collect();
        let distances = corpus.distances_for_archetypes(&noisy, None, None, metric);
        series.correlate(&distances, method)
    });

    let margin = criteria.sign_margin;
    let n_preserved = trials
        .iter()
        .flatten()
        .filter(|&&r| r.signum() == observed.signum() && r.abs() >= margin)
        .count();
    let robustness = n_preserved as f64 / n_trials as f64;
    let robust = robustness >= criteria.robust_threshold;

    debug!(sigma, robustness, robust, "sensitivity trials complete");

    Analysis::Success(SensitivityReport {
        method,
        sigma,
        n_trials,
        seed,
        observed_r: observed,
        n_preserved,
        robustness,
        robust,
        sign_margin: margin,
        robust_threshold: criteria.robust_threshold,
        distribution: NullDistribution::from_trials(&trials),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::planted_corpus;

    #[test]
    fn test_planted_corpus_is_robust() {
        let corpus = planted_corpus(20, 7);
        let report = coordinate_sensitivity(&corpus, 0.05, 100, 13).into_success().unwrap();
        assert!(report.robustness > 0.95);
        assert!(report.robust);
        assert!(report.distribution.p95 < 0.0);
    }

    #[test]
    fn test_zero_sigma_reproduces_observed() {
        let corpus = planted_corpus(10, 2);
        let report = coordinate_sensitivity(&corpus, 0.0, 5, 1).into_success().unwrap();
        assert_eq!(report.distribution.min, report.observed_r);
        assert_eq!(report.distribution.max, report.observed_r);
        assert_eq!(report.n_preserved, 5);
    }

    #[test]
    fn test_negative_sigma_invalid() {
        let corpus = planted_corpus(10, 2);
        assert_eq!(coordinate_sensitivity(&corpus, -1.0, 5, 1).kind(), "invalid");
    }

    #[test]
    fn test_parallel_matches_serial() {
        let corpus = planted_corpus(10, 2);
        let criteria = VerdictCriteria::default();
        let run = |parallel| {
            coordinate_sensitivity_with(&corpus, 0.1, 40, 3, CorrelationMethod::Spearman, &criteria, parallel)
        };
        assert_eq!(run(false), run(true));
    }
}
