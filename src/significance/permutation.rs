//! Permutation null model: shuffle which entity carries which coordinate
//! vector, keep co-occurrence fixed.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{correlate_series, CoordinateVector, Corpus};
use crate::outcome::{try_analysis, Analysis, MIN_PAIRS};
use crate::stats::{CorrelationMethod, NullDistribution};
use crate::trials::{run_trials, trial_rng};

/// Permutation test result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationReport {
    pub method: CorrelationMethod,
    pub observed_r: f64,
    /// Fraction of valid null trials with r ≤ observed
    pub p_value: f64,
    /// (observed − null mean) / null std, 0 when the null has no spread
    pub z_score: f64,
    pub n_trials: usize,
    pub seed: u64,
    pub null: NullDistribution,
}

impl PermutationReport {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Spearman permutation test, trials dispatched serially
pub fn permutation_test(corpus: &Corpus, n_trials: usize, seed: u64) -> Analysis<PermutationReport> {
    permutation_test_with(corpus, n_trials, seed, CorrelationMethod::Spearman, false)
}

/// Permutation test with an explicit statistic and dispatch mode.
///
/// Trial `t` shuffles with stream `t` of the seeded generator, so the result
/// does not depend on `parallel`.
pub fn permutation_test_with(
    corpus: &Corpus,
    n_trials: usize,
    seed: u64,
    method: CorrelationMethod,
    parallel: bool,
) -> Analysis<PermutationReport> {
    if corpus.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(corpus.len());
    }
    if n_trials == 0 {
        return Analysis::invalid("n_trials must be > 0");
    }

    let series = corpus.cooccurrence_series();
    let observed = try_analysis!(correlate_series(&corpus.distances(), &series, method));

    let coords = corpus.entity_coordinates();
    let trials: Vec<Option<f64>> = run_trials(n_trials, parallel, |t| {
        let mut rng = trial_rng(seed, t);
        let mut shuffled: Vec<CoordinateVector> = coords.clone();
        shuffled.shuffle(&mut rng);
        series.correlate(&corpus.distances_for_entities(&shuffled), method)
    });

    let null = NullDistribution::from_trials(&trials);
    if null.n_valid == 0 {
        warn!(n_trials, "every permutation trial was degenerate");
        return Analysis::degenerate("every permutation trial was degenerate");
    }
    if null.n_degenerate > 0 {
        debug!(skipped = null.n_degenerate, "degenerate permutation trials skipped");
    }

    let at_or_below = trials.iter().flatten().filter(|&&r| r <= observed).count();
    let p_value = at_or_below as f64 / null.n_valid as f64;
    let z_score = if null.std > 0.0 {
        (observed - null.mean) / null.std
    } else {
        0.0
    };

    debug!(observed, p_value, z_score, "permutation test complete");

    Analysis::Success(PermutationReport {
        method,
        observed_r: observed,
        p_value,
        z_score,
        n_trials,
        seed,
        null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::planted_corpus;

    #[test]
    fn test_planted_signal_is_significant() {
        let corpus = planted_corpus(20, 7);
        let report = permutation_test(&corpus, 200, 42).into_success().unwrap();
        assert!(report.observed_r < 0.0);
        assert!(report.p_value < 0.05);
        assert!(report.z_score < 0.0);
        assert_eq!(report.null.n_valid + report.null.n_degenerate, 200);
    }

    #[test]
    fn test_same_seed_same_p() {
        let corpus = planted_corpus(12, 3);
        let a = permutation_test(&corpus, 100, 9).into_success().unwrap();
        let b = permutation_test(&corpus, 100, 9).into_success().unwrap();
        assert_eq!(a.p_value.to_bits(), b.p_value.to_bits());
        assert_eq!(a.null, b.null);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let corpus = planted_corpus(12, 3);
        let serial =
            permutation_test_with(&corpus, 64, 5, CorrelationMethod::Spearman, false);
        let parallel =
            permutation_test_with(&corpus, 64, 5, CorrelationMethod::Spearman, true);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_zero_trials_invalid() {
        let corpus = planted_corpus(12, 3);
        assert_eq!(permutation_test(&corpus, 0, 1).kind(), "invalid");
    }
}
