//! Mantel test: the full entity distance matrix is computed once and each
//! trial relabels its rows and columns jointly.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{distance, Corpus};
use crate::outcome::{Analysis, MIN_PAIRS};
use crate::stats::{CorrelationMethod, NullDistribution};
use crate::trials::{run_trials, trial_rng};

/// Mantel test result (Pearson statistic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MantelReport {
    pub observed_r: f64,
    /// Fraction of valid null trials with r ≤ observed
    pub p_one_sided: f64,
    /// Fraction of valid null trials with |r| ≥ |observed|
    pub p_two_sided: f64,
    pub n_entities: usize,
    pub n_trials: usize,
    pub seed: u64,
    pub null: NullDistribution,
}

/// Entity × entity distance matrix, row-major
struct DistanceMatrix {
    n: usize,
    cells: Vec<f64>,
}

impl DistanceMatrix {
    fn for_corpus(corpus: &Corpus) -> Self {
        let coords = corpus.entity_coordinates();
        let n = coords.len();
        let mut cells = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance(&coords[i], &coords[j], None, None, corpus.metric());
                cells[i * n + j] = d;
                cells[j * n + i] = d;
            }
        }
        Self { n, cells }
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.n + j]
    }
}

pub fn mantel_test(corpus: &Corpus, n_trials: usize, seed: u64) -> Analysis<MantelReport> {
    mantel_test_with(corpus, n_trials, seed, false)
}

pub fn mantel_test_with(
    corpus: &Corpus,
    n_trials: usize,
    seed: u64,
    parallel: bool,
) -> Analysis<MantelReport> {
    if corpus.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(corpus.len());
    }
    if n_trials == 0 {
        return Analysis::invalid("n_trials must be > 0");
    }

    let matrix = DistanceMatrix::for_corpus(corpus);
    let series = corpus.cooccurrence_series();
    let pairs = corpus.pairs();

    let observed_d: Vec<f64> = pairs.iter().map(|p| matrix.get(p.entity_a, p.entity_b)).collect();
    let Some(observed) = series.correlate(&observed_d, CorrelationMethod::Pearson) else {
        return Analysis::degenerate("distance or co-occurrence array has no variance");
    };

    let trials: Vec<Option<f64>> = run_trials(n_trials, parallel, |t| {
        let mut rng = trial_rng(seed, t);
        let mut labels: Vec<usize> = (0..matrix.n).collect();
        labels.shuffle(&mut rng);
        let permuted: Vec<f64> = pairs
            .iter()
            .map(|p| matrix.get(labels[p.entity_a], labels[p.entity_b]))
            .collect();
        series.correlate(&permuted, CorrelationMethod::Pearson)
    });

    let null = NullDistribution::from_trials(&trials);
    if null.n_valid == 0 {
        warn!(n_trials, "every Mantel trial was degenerate");
        return Analysis::degenerate("every Mantel trial was degenerate");
    }

    let valid = null.n_valid as f64;
    let below = trials.iter().flatten().filter(|&&r| r <= observed).count() as f64;
    let extreme = trials
        .iter()
        .flatten()
        .filter(|&&r| r.abs() >= observed.abs())
        .count() as f64;

    let report = MantelReport {
        observed_r: observed,
        p_one_sided: below / valid,
        p_two_sided: extreme / valid,
        n_entities: matrix.n,
        n_trials,
        seed,
        null,
    };
    debug!(
        observed,
        p_one_sided = report.p_one_sided,
        p_two_sided = report.p_two_sided,
        "Mantel test complete"
    );
    Analysis::Success(report)
}
