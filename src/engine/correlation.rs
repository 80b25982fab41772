//! Distance ↔ co-occurrence correlation for a corpus.

use serde::{Deserialize, Serialize};

use super::coordinates::{Axis, N_AXES};
use super::corpus::Corpus;
use crate::outcome::{Analysis, MIN_PAIRS};
use crate::stats::{
    correlation_p_value, float_cmp, is_degenerate, mean, median, std_dev, CorrelationMethod,
    FixedSeries,
};

/// Full-model correlation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub n_pairs: usize,
    pub pearson_r: f64,
    pub pearson_p: f64,
    pub spearman_r: f64,
    pub spearman_p: f64,
    pub mean_distance: f64,
    pub std_distance: f64,
    pub mean_cooccurrence: f64,
    pub median_cooccurrence: f64,
    pub max_cooccurrence: f64,
}

impl CorrelationReport {
    /// r for the chosen statistic
    pub fn r(&self, method: CorrelationMethod) -> f64 {
        match method {
            CorrelationMethod::Pearson => self.pearson_r,
            CorrelationMethod::Spearman => self.spearman_r,
        }
    }

    pub fn p(&self, method: CorrelationMethod) -> f64 {
        match method {
            CorrelationMethod::Pearson => self.pearson_p,
            CorrelationMethod::Spearman => self.spearman_p,
        }
    }
}

/// Correlate a distance column against the fixed co-occurrence series
pub fn correlate_series(
    distances: &[f64],
    cooccurrence: &FixedSeries,
    method: CorrelationMethod,
) -> Analysis<f64> {
    if distances.len() < MIN_PAIRS {
        return Analysis::insufficient_pairs(distances.len());
    }
    match cooccurrence.correlate(distances, method) {
        Some(r) => Analysis::Success(r),
        None => Analysis::degenerate("distance or co-occurrence array has no variance"),
    }
}

/// Pearson and Spearman correlation between pair distance and co-occurrence
pub fn correlate(corpus: &Corpus) -> Analysis<CorrelationReport> {
    let n = corpus.len();
    if n < MIN_PAIRS {
        return Analysis::insufficient_pairs(n);
    }

    let distances = corpus.distances();
    let series = corpus.cooccurrence_series();

    if is_degenerate(&distances) {
        return Analysis::degenerate("all pair distances are identical");
    }
    if series.is_degenerate() {
        return Analysis::degenerate("all co-occurrence counts are identical");
    }

    let (Some(pearson_r), Some(spearman_r)) = (
        series.correlate(&distances, CorrelationMethod::Pearson),
        series.correlate(&distances, CorrelationMethod::Spearman),
    ) else {
        return Analysis::degenerate("correlation undefined");
    };

    let cooc = series.values();
    let max_cooccurrence = cooc.iter().copied().max_by(float_cmp).unwrap_or(0.0);

    Analysis::Success(CorrelationReport {
        n_pairs: n,
        pearson_r,
        pearson_p: correlation_p_value(pearson_r, n),
        spearman_r,
        spearman_p: correlation_p_value(spearman_r, n),
        mean_distance: mean(&distances),
        std_distance: std_dev(&distances),
        mean_cooccurrence: mean(cooc),
        median_cooccurrence: median(cooc),
        max_cooccurrence,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-AXIS
// ═══════════════════════════════════════════════════════════════════════════════

/// One axis' absolute-difference correlation with co-occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisCorrelation {
    pub axis: Axis,
    /// `None` when the axis' differences are constant
    pub r: Option<f64>,
    pub p: Option<f64>,
}

/// Axes ranked by |r| descending; undefined axes last
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerAxisReport {
    pub method: CorrelationMethod,
    pub n_pairs: usize,
    pub axes: Vec<AxisCorrelation>,
}

impl PerAxisReport {
    /// r for `axis` (None if undefined)
    pub fn r_for(&self, axis: Axis) -> Option<f64> {
        self.axes.iter().find(|a| a.axis == axis).and_then(|a| a.r)
    }

    /// |r| in axis order, undefined → 0
    pub fn abs_by_axis(&self) -> [f64; N_AXES] {
        let mut out = [0.0; N_AXES];
        for a in &self.axes {
            out[a.axis.index()] = a.r.map(f64::abs).unwrap_or(0.0);
        }
        out
    }
}

/// Per-axis |Δcoordinate| vs co-occurrence, ranked by |r|
pub fn per_axis_correlation(corpus: &Corpus, method: CorrelationMethod) -> Analysis<PerAxisReport> {
    let n = corpus.len();
    if n < MIN_PAIRS {
        return Analysis::insufficient_pairs(n);
    }
    let series = corpus.cooccurrence_series();
    if series.is_degenerate() {
        return Analysis::degenerate("all co-occurrence counts are identical");
    }

    let coords = corpus.entity_coordinates();
    let mut axes: Vec<AxisCorrelation> = Axis::ALL
        .iter()
        .map(|&axis| {
            let k = axis.index();
            let diffs: Vec<f64> = corpus
                .pairs()
                .iter()
                .map(|p| (coords[p.entity_a].values()[k] - coords[p.entity_b].values()[k]).abs())
                .collect();
            let r = series.correlate(&diffs, method);
            AxisCorrelation {
                axis,
                r,
                p: r.map(|r| correlation_p_value(r, n)),
            }
        })
        .collect();

    axes.sort_by(|a, b| {
        let ka = a.r.map(f64::abs).unwrap_or(-1.0);
        let kb = b.r.map(f64::abs).unwrap_or(-1.0);
        float_cmp(&kb, &ka).then(a.axis.cmp(&b.axis))
    });

    Analysis::Success(PerAxisReport {
        method,
        n_pairs: n,
        axes,
    })
}
