//! The declared simpler model the full 8-axis model has to beat.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::engine::{correlate_series, per_axis_correlation, CoordinateVector, Corpus, N_AXES};
use crate::outcome::{try_analysis, Analysis, MIN_PAIRS};
use crate::stats::{float_cmp, mean};
use crate::trials::{derive_seed, run_trials, trial_rng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaselineKind {
    /// Single axis whose |Δ| correlates most negatively with co-occurrence
    #[default]
    BestSingleAxis,
    /// Mean r over uniformly random archetype coordinates
    RandomCoordinates,
}

/// Baseline correlation and how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineModel {
    pub kind: BaselineKind,
    pub r: f64,
    pub label: String,
    /// Valid draws, random-coordinates only
    pub n_trials: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub model_r: f64,
    pub baseline: BaselineModel,
    /// model_r − baseline r; negative means the model is ahead
    pub margin: f64,
    /// Model correlation strictly more negative than the baseline's
    pub model_better: bool,
}

impl BaselineComparison {
    pub fn new(model_r: f64, baseline: BaselineModel) -> Self {
        Self {
            model_r,
            margin: model_r - baseline.r,
            model_better: model_r < baseline.r,
            baseline,
        }
    }
}

pub fn baseline_model(corpus: &Corpus, config: &AnalysisConfig) -> Analysis<BaselineModel> {
    if corpus.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(corpus.len());
    }
    match config.ablation.baseline {
        BaselineKind::BestSingleAxis => {
            let per_axis = try_analysis!(per_axis_correlation(corpus, config.method));
            let best = per_axis
                .axes
                .iter()
                .filter_map(|a| a.r.map(|r| (a.axis, r)))
                .min_by(|a, b| float_cmp(&a.1, &b.1));
            match best {
                Some((axis, r)) => Analysis::Success(BaselineModel {
                    kind: BaselineKind::BestSingleAxis,
                    r,
                    label: format!("best single axis ({})", axis),
                    n_trials: None,
                }),
                None => Analysis::degenerate("no single axis has a defined correlation"),
            }
        }
        BaselineKind::RandomCoordinates => {
            let n_trials = config.ablation.baseline_trials;
            if n_trials == 0 {
                return Analysis::invalid("baseline_trials must be > 0");
            }
            let seed = derive_seed(config.seed, "baseline");
            let series = corpus.cooccurrence_series();
            let n_archetypes = corpus.archetypes().len();
            let draws: Vec<Option<f64>> = run_trials(n_trials, config.parallel, |t| {
                let mut rng = trial_rng(seed, t);
                let coords: Vec<CoordinateVector> = (0..n_archetypes)
                    .map(|_| {
                        let mut v = [0.0; N_AXES];
                        for x in v.iter_mut() {
                            *x = rng.gen::<f64>();
                        }
                        CoordinateVector::clamped(v)
                    })
                    .collect();
                let d = corpus.distances_for_archetypes(&coords, None, None, corpus.metric());
                series.correlate(&d, config.method)
            });
            let valid: Vec<f64> = draws.into_iter().flatten().collect();
            if valid.is_empty() {
                return Analysis::degenerate("every random-coordinate draw was degenerate");
            }
            Analysis::Success(BaselineModel {
                kind: BaselineKind::RandomCoordinates,
                r: mean(&valid),
                label: format!("random coordinates (mean of {})", valid.len()),
                n_trials: Some(valid.len()),
            })
        }
    }
}

/// Full uniform model against the configured baseline
pub fn compare_to_baseline(corpus: &Corpus, config: &AnalysisConfig) -> Analysis<BaselineComparison> {
    let model_r = try_analysis!(correlate_series(
        &corpus.distances(),
        &corpus.cooccurrence_series(),
        config.method
    ));
    let baseline = try_analysis!(baseline_model(corpus, config));
    debug!(model_r, baseline_r = baseline.r, "baseline comparison");
    Analysis::Success(BaselineComparison::new(model_r, baseline))
}
