//! Leave-one-axis-out ablation.
//!
//! delta = r_without − r_full. The model predicts a negative r, so a
//! negative delta means the model does better without the axis.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::search::PairDistanceCache;
use crate::config::AnalysisConfig;
use crate::engine::{Axis, AxisWeights, Corpus, N_AXES};
use crate::outcome::{Analysis, MIN_PAIRS};
use crate::stats::{float_cmp, CorrelationMethod};

/// How an axis affects the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    /// Removing it makes r more negative by more than the threshold
    Harmful,
    /// |delta| within the threshold
    Noise,
    /// Removing it weakens the correlation
    Beneficial,
    /// Zero weight in the model under test
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AblationResult {
    pub axis: Axis,
    /// `None` when removing the axis leaves no distance variance
    pub r_without: Option<f64>,
    pub delta: Option<f64>,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AblationReport {
    pub method: CorrelationMethod,
    pub weights: AxisWeights,
    pub r_full: f64,
    pub harmful_threshold: f64,
    /// Ranked by delta descending; undefined deltas first, inactive axes last
    pub axes: Vec<AblationResult>,
    pub harmful: Vec<Axis>,
    /// One line per harmful axis
    pub concerns: Vec<String>,
}

impl AblationReport {
    pub fn get(&self, axis: Axis) -> Option<&AblationResult> {
        self.axes.iter().find(|a| a.axis == axis)
    }

    pub fn has_harmful(&self) -> bool {
        !self.harmful.is_empty()
    }
}

/// Ablation of the uniform-weight model
pub fn axis_ablation(corpus: &Corpus, config: &AnalysisConfig) -> Analysis<AblationReport> {
    axis_ablation_weighted(corpus, &AxisWeights::uniform(), config)
}

/// Ablation of an arbitrarily weighted model
pub fn axis_ablation_weighted(
    corpus: &Corpus,
    weights: &AxisWeights,
    config: &AnalysisConfig,
) -> Analysis<AblationReport> {
    if corpus.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(corpus.len());
    }
    if !weights.is_valid() {
        return Analysis::invalid("weights must be finite, non-negative, not all zero");
    }

    let method = config.method;
    let threshold = config.criteria.harmful_threshold;
    let series = corpus.cooccurrence_series();
    let cache = PairDistanceCache::from_corpus(corpus);
    let all_axes: Vec<usize> = (0..N_AXES).collect();

    let Some(r_full) = series.correlate(&cache.distances(&weights.0, &all_axes), method) else {
        return Analysis::degenerate("distance or co-occurrence array has no variance");
    };

    let mut axes: Vec<AblationResult> = Axis::ALL
        .iter()
        .map(|&axis| {
            if weights.get(axis) <= 0.0 {
                return AblationResult {
                    axis,
                    r_without: Some(r_full),
                    delta: Some(0.0),
                    impact: Impact::Inactive,
                };
            }
            let mut reduced = weights.0;
            reduced[axis.index()] = 0.0;
            let r_without = series.correlate(&cache.distances(&reduced, &all_axes), method);
            let delta = r_without.map(|r| r - r_full);
            let impact = match delta {
                Some(d) if d < -threshold => Impact::Harmful,
                Some(d) if d.abs() <= threshold => Impact::Noise,
                Some(_) => Impact::Beneficial,
                // the axis carries all remaining distance variance
                None => Impact::Beneficial,
            };
            AblationResult {
                axis,
                r_without,
                delta,
                impact,
            }
        })
        .collect();

    axes.sort_by(|a, b| {
        let inactive = |x: &AblationResult| x.impact == Impact::Inactive;
        let key = |x: &AblationResult| x.delta.unwrap_or(f64::INFINITY);
        inactive(a)
            .cmp(&inactive(b))
            .then(float_cmp(&key(b), &key(a)))
            .then(a.axis.cmp(&b.axis))
    });

    let mut harmful: Vec<Axis> = axes
        .iter()
        .filter(|a| a.impact == Impact::Harmful)
        .map(|a| a.axis)
        .collect();
    harmful.sort();

    let concerns: Vec<String> = harmful
        .iter()
        .filter_map(|&axis| axes.iter().find(|a| a.axis == axis))
        .map(|a| {
            format!(
                "Removing {} strengthens the correlation (delta = {:+.4}); the axis works against the model",
                a.axis,
                a.delta.unwrap_or(0.0)
            )
        })
        .collect();

    if harmful.is_empty() {
        debug!(r_full, "no harmful axes");
    } else {
        warn!(count = harmful.len(), "harmful axes found");
    }

    Analysis::Success(AblationReport {
        method,
        weights: *weights,
        r_full,
        harmful_threshold: threshold,
        axes,
        harmful,
        concerns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ArchetypePoint, CoordinateVector, CorpusEntity, PairObservation};

    /// Axis 0 carries the signal, axis 1 is anti-correlated with it
    fn signal_with_harmful_axis() -> Corpus {
        let n = 8;
        let archetypes: Vec<ArchetypePoint> = (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                let mut c = [0.5; N_AXES];
                c[0] = t;
                // large spread that runs against co-occurrence
                c[1] = if i % 2 == 0 { 0.0 } else { 1.0 };
                ArchetypePoint {
                    id: format!("a{}", i),
                    coordinates: CoordinateVector::new(c).unwrap(),
                }
            })
            .collect();
        let entities: Vec<CorpusEntity> = (0..n)
            .map(|i| CorpusEntity {
                id: format!("e{}", i),
                archetype: i,
                tradition: None,
            })
            .collect();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let a = archetypes[i].coordinates;
                let b = archetypes[j].coordinates;
                let gap = (a.values()[0] - b.values()[0]).abs();
                pairs.push(PairObservation {
                    entity_a: i,
                    entity_b: j,
                    distance: crate::engine::distance(
                        &a,
                        &b,
                        None,
                        None,
                        crate::engine::DistanceMetric::Euclidean,
                    ),
                    cooccurrence: (100.0 * (1.0 - gap)) as u64,
                });
            }
        }
        Corpus::from_parts(archetypes, entities, pairs)
    }

    #[test]
    fn test_detects_harmful_axis() {
        let corpus = signal_with_harmful_axis();
        let report = axis_ablation(&corpus, &AnalysisConfig::default())
            .into_success()
            .unwrap();
        assert_eq!(report.harmful, vec![Axis::CreationDestruction]);
        assert_eq!(report.concerns.len(), 1);
        assert_eq!(report.get(Axis::OrderChaos).unwrap().impact, Impact::Beneficial);
        // constant axes change nothing
        assert_eq!(report.get(Axis::LightShadow).unwrap().impact, Impact::Noise);
        assert!(report.axes.windows(2).all(|w| {
            let (a, b) = (w[0].delta.unwrap_or(f64::INFINITY), w[1].delta.unwrap_or(f64::INFINITY));
            a >= b
        }));
    }

    #[test]
    fn test_weighted_ablation_marks_inactive() {
        let corpus = signal_with_harmful_axis();
        let weights = AxisWeights::without(Axis::CreationDestruction);
        let report = axis_ablation_weighted(&corpus, &weights, &AnalysisConfig::default())
            .into_success()
            .unwrap();
        assert!(!report.has_harmful());
        assert_eq!(
            report.get(Axis::CreationDestruction).unwrap().impact,
            Impact::Inactive
        );
        assert_eq!(report.axes.last().unwrap().impact, Impact::Inactive);
        // only axis 0 varies: removing it leaves constant distances
        assert_eq!(report.get(Axis::OrderChaos).unwrap().r_without, None);
    }
}
