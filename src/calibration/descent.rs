//! Batch gradient descent on archetype coordinates.
//!
//! Loss is the mean squared error between realized distance (weighted
//! Euclidean, normalized by `sqrt(Σw)`) and the co-occurrence target over the
//! training pairs. Each step clamps to [0,1], then clamps the cumulative
//! shift from the original value to ±max_shift. The shift clamp is applied
//! last and always wins.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use super::target::target_distances;
use crate::config::CalibrationConfig;
use crate::engine::{
    correlate, ArchetypePoint, AxisWeights, CooccurrenceProvider, CoordinateVector, Corpus,
    CorrelationReport, DistanceMetric, EntityArchetypeBinding, CorpusBuilder, N_AXES,
};
use crate::outcome::{try_analysis, Analysis, MIN_PAIRS};
use crate::stats::spearman;

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Why descent stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// |Δloss| fell below tolerance
    Converged,
    StepLimit,
}

/// Clamp events during descent; diagnostics only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundViolations {
    /// Coordinate pushed outside [0,1]
    pub unit_interval: usize,
    /// Coordinate pushed beyond ±max_shift of its original value
    pub max_shift: usize,
}

impl BoundViolations {
    pub fn total(&self) -> usize {
        self.unit_interval + self.max_shift
    }
}

/// Archetype coordinate matrix under optimization.
///
/// Updates are accepted until the state is frozen; the original coordinates
/// are kept alongside for before/after comparison.
#[derive(Debug, Clone)]
pub struct CalibrationState {
    original: Vec<CoordinateVector>,
    current: Vec<[f64; N_AXES]>,
    max_shift: f64,
    steps: usize,
    violations: BoundViolations,
    frozen: Option<StopReason>,
}

impl CalibrationState {
    pub fn new(original: Vec<CoordinateVector>, max_shift: f64) -> Self {
        let current = original.iter().map(|c| *c.values()).collect();
        Self {
            original,
            current,
            max_shift,
            steps: 0,
            violations: BoundViolations::default(),
            frozen: None,
        }
    }

    pub fn original(&self) -> &[CoordinateVector] {
        &self.original
    }

    pub fn current(&self) -> Vec<CoordinateVector> {
        self.current.iter().map(|c| CoordinateVector::clamped(*c)).collect()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn violations(&self) -> BoundViolations {
        self.violations
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.frozen
    }

    pub fn freeze(&mut self, reason: StopReason) {
        self.frozen.get_or_insert(reason);
    }

    /// Largest |current − original| over all coordinates
    pub fn max_displacement(&self) -> f64 {
        self.current
            .iter()
            .zip(&self.original)
            .flat_map(|(c, o)| c.iter().zip(o.values()).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max)
    }

    /// Apply `x ← x − lr·g` with both clamps. Returns false once frozen.
    pub fn apply_gradient(&mut self, gradient: &[[f64; N_AXES]], learning_rate: f64) -> bool {
        if self.is_frozen() {
            return false;
        }
        for ((coords, grad), orig) in self.current.iter_mut().zip(gradient).zip(&self.original) {
            for k in 0..N_AXES {
                let mut x = coords[k] - learning_rate * grad[k];
                if !x.is_finite() {
                    x = coords[k];
                }
                if !(0.0..=1.0).contains(&x) {
                    self.violations.unit_interval += 1;
                    x = x.clamp(0.0, 1.0);
                }
                let lo = orig.values()[k] - self.max_shift;
                let hi = orig.values()[k] + self.max_shift;
                if x < lo || x > hi {
                    self.violations.max_shift += 1;
                    x = x.clamp(lo, hi);
                }
                coords[k] = x;
            }
        }
        self.steps += 1;
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GRADIENT
// ═══════════════════════════════════════════════════════════════════════════════

/// One training pair in archetype space
#[derive(Debug, Clone, Copy)]
struct TrainingPair {
    a: usize,
    b: usize,
    target: f64,
}

/// Loss and gradient accumulated over one chunk of pairs
struct Partial {
    loss: f64,
    gradient: Vec<[f64; N_AXES]>,
}

fn chunk_partial(
    chunk: &[TrainingPair],
    coords: &[[f64; N_AXES]],
    weights: &[f64; N_AXES],
    weight_total: f64,
    n_pairs: f64,
) -> Partial {
    let mut partial = Partial {
        loss: 0.0,
        gradient: vec![[0.0; N_AXES]; coords.len()],
    };
    for pair in chunk {
        let (xa, xb) = (&coords[pair.a], &coords[pair.b]);
        let mut sum = 0.0;
        for k in 0..N_AXES {
            let d = xa[k] - xb[k];
            sum += weights[k] * (d * d);
        }
        let realized = (sum / weight_total).sqrt();
        let residual = realized - pair.target;
        partial.loss += residual * residual / n_pairs;

        // coincident points: distance is not differentiable, no pull
        if realized <= 0.0 || pair.a == pair.b {
            continue;
        }
        let scale = 2.0 * residual / (n_pairs * realized * weight_total);
        for k in 0..N_AXES {
            let g = scale * weights[k] * (xa[k] - xb[k]);
            partial.gradient[pair.a][k] += g;
            partial.gradient[pair.b][k] -= g;
        }
    }
    partial
}

/// Loss and full gradient; chunks reduced in chunk order
fn loss_and_gradient(
    pairs: &[TrainingPair],
    coords: &[[f64; N_AXES]],
    weights: &AxisWeights,
    chunk_size: usize,
    parallel: bool,
) -> (f64, Vec<[f64; N_AXES]>) {
    let w = &weights.0;
    let total = weights.total();
    let n = pairs.len() as f64;
    let size = chunk_size.max(1);

    let partials: Vec<Partial> = if parallel {
        pairs
            .par_chunks(size)
            .map(|chunk| chunk_partial(chunk, coords, w, total, n))
            .collect()
    } else {
        pairs
            .chunks(size)
            .map(|chunk| chunk_partial(chunk, coords, w, total, n))
            .collect()
    };

    let mut loss = 0.0;
    let mut gradient = vec![[0.0; N_AXES]; coords.len()];
    for partial in partials {
        loss += partial.loss;
        for (acc, g) in gradient.iter_mut().zip(&partial.gradient) {
            for k in 0..N_AXES {
                acc[k] += g[k];
            }
        }
    }
    (loss, gradient)
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of one descent run over a training pair set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescentSummary {
    pub n_train_pairs: usize,
    pub steps: usize,
    pub stop_reason: StopReason,
    pub initial_loss: f64,
    pub final_loss: f64,
    /// Loss before each step, then the loss after the last step
    pub loss_history: Vec<f64>,
    pub violations: BoundViolations,
    pub max_displacement: f64,
}

/// Calibrated archetype coordinates with the originals they started from
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    pub state: CalibrationState,
    pub summary: DescentSummary,
}

impl CalibrationRun {
    pub fn calibrated(&self) -> Vec<CoordinateVector> {
        self.state.current()
    }
}

/// Exported calibration result for the full corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationResult {
    pub original: Vec<ArchetypePoint>,
    pub calibrated: Vec<ArchetypePoint>,
    pub descent: DescentSummary,
    pub before: Analysis<CorrelationReport>,
    pub after: Analysis<CorrelationReport>,
}

impl CalibrationResult {
    /// Spearman r after minus before, when both are defined
    pub fn spearman_change(&self) -> Option<f64> {
        match (self.before.success(), self.after.success()) {
            (Some(b), Some(a)) => Some(a.spearman_r - b.spearman_r),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Descend on the given subset of corpus pairs. Targets are normalized over
/// that subset only.
pub fn calibrate_pairs(
    corpus: &Corpus,
    pair_indices: &[usize],
    config: &CalibrationConfig,
) -> Analysis<CalibrationRun> {
    if pair_indices.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(pair_indices.len());
    }
    if !(config.learning_rate > 0.0 && config.learning_rate.is_finite()) {
        return Analysis::invalid("learning_rate must be finite and > 0");
    }
    if !(0.0..=1.0).contains(&config.max_shift) {
        return Analysis::invalid("max_shift must be in [0, 1]");
    }
    if !config.axis_weights.is_valid() {
        return Analysis::invalid("axis weights must be finite, non-negative, not all zero");
    }

    let all_pairs = corpus.pairs();
    let entities = corpus.entities();
    let cooc: Vec<f64> = pair_indices
        .iter()
        .map(|&i| all_pairs[i].cooccurrence as f64)
        .collect();
    let targets = target_distances(&cooc);
    let training: Vec<TrainingPair> = pair_indices
        .iter()
        .zip(targets)
        .map(|(&i, target)| TrainingPair {
            a: entities[all_pairs[i].entity_a].archetype,
            b: entities[all_pairs[i].entity_b].archetype,
            target,
        })
        .collect();

    let mut state = CalibrationState::new(corpus.archetype_coordinates(), config.max_shift);
    let mut loss_history = Vec::with_capacity(config.max_steps + 1);
    let mut previous: Option<f64> = None;

    while state.steps() < config.max_steps {
        let (loss, gradient) = loss_and_gradient(
            &training,
            &state.current,
            &config.axis_weights,
            config.chunk_size,
            config.parallel,
        );
        loss_history.push(loss);
        if let Some(prev) = previous {
            if (prev - loss).abs() < config.tolerance {
                state.freeze(StopReason::Converged);
                break;
            }
        }
        previous = Some(loss);
        state.apply_gradient(&gradient, config.learning_rate);
    }

    if !state.is_frozen() {
        let (loss, _) = loss_and_gradient(
            &training,
            &state.current,
            &config.axis_weights,
            config.chunk_size,
            config.parallel,
        );
        loss_history.push(loss);
        state.freeze(StopReason::StepLimit);
    }

    let summary = DescentSummary {
        n_train_pairs: training.len(),
        steps: state.steps(),
        stop_reason: state.stop_reason().unwrap_or(StopReason::StepLimit),
        initial_loss: loss_history.first().copied().unwrap_or(0.0),
        final_loss: loss_history.last().copied().unwrap_or(0.0),
        loss_history,
        violations: state.violations(),
        max_displacement: state.max_displacement(),
    };
    debug!(
        steps = summary.steps,
        initial_loss = summary.initial_loss,
        final_loss = summary.final_loss,
        clamps = summary.violations.total(),
        "descent finished"
    );

    Analysis::Success(CalibrationRun { state, summary })
}

/// Calibrate every archetype against all corpus pairs
pub fn calibrate_corpus(corpus: &Corpus, config: &CalibrationConfig) -> Analysis<CalibrationResult> {
    let all: Vec<usize> = (0..corpus.len()).collect();
    let run = try_analysis!(calibrate_pairs(corpus, &all, config));

    let calibrated = run.calibrated();
    let after_corpus = corpus.with_archetype_coordinates(&calibrated);

    info!(
        steps = run.summary.steps,
        stop = ?run.summary.stop_reason,
        max_displacement = run.summary.max_displacement,
        "calibration complete"
    );

    Analysis::Success(CalibrationResult {
        original: corpus.archetypes().to_vec(),
        calibrated: after_corpus.archetypes().to_vec(),
        descent: run.summary,
        before: correlate(corpus),
        after: correlate(&after_corpus),
    })
}

/// Build the corpus from bindings, then calibrate it
pub fn calibrate<P: CooccurrenceProvider + ?Sized>(
    bindings: &[EntityArchetypeBinding],
    cooccurrence: &P,
    config: &CalibrationConfig,
) -> Analysis<CalibrationResult> {
    let corpus = try_analysis!(CorpusBuilder::new(cooccurrence).build(bindings));
    calibrate_corpus(&corpus, config)
}

/// Spearman r between weighted distance under `coordinates` and raw
/// co-occurrence, over a subset of pairs
pub(crate) fn subset_spearman(
    corpus: &Corpus,
    coordinates: &[CoordinateVector],
    weights: &AxisWeights,
    pair_indices: &[usize],
) -> Option<f64> {
    let subset = corpus.with_pairs(pair_indices);
    let distances =
        subset.distances_for_archetypes(coordinates, Some(weights), None, DistanceMetric::Euclidean);
    spearman(&distances, &subset.cooccurrences())
}

/// Pair indices not in `held_out`
pub(crate) fn complement(n_pairs: usize, held_out: &[usize]) -> Vec<usize> {
    let held: HashSet<usize> = held_out.iter().copied().collect();
    (0..n_pairs).filter(|i| !held.contains(i)).collect()
}
