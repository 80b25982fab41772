//! ═══════════════════════════════════════════════════════════════════════════════
//! STATS — Statistical Primitives for the Falsification Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Core statistical tools:
//! - Pearson / Spearman correlation with explicit degeneracy guard
//! - Average ranks (ties share the mean rank)
//! - Two-sided correlation p-values via Student's t
//! - Percentiles and distribution summaries for null models
//!
//! Every correlation returns `Option<f64>`: `None` means undefined (flat input),
//! never NaN.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Variance floor below which an array counts as constant
pub const VARIANCE_EPSILON: f64 = 1e-12;

/// Total ordering for f64 sorts (NaN-safe)
pub fn float_cmp(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}

// ═══════════════════════════════════════════════════════════════════════════════
// DESCRIPTIVE
// ═══════════════════════════════════════════════════════════════════════════════

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(float_cmp);
    percentile_sorted(&sorted, 50.0)
}

/// Linear-interpolated percentile of an already sorted slice (q in 0..=100)
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// True when the array has fewer than two distinct values (variance ~ 0)
pub fn is_degenerate(values: &[f64]) -> bool {
    if values.len() < 2 {
        return true;
    }
    let m = mean(values);
    let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    !(var > VARIANCE_EPSILON)
}

// ═══════════════════════════════════════════════════════════════════════════════
// CORRELATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Pearson correlation, `None` if either array is degenerate
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }

    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let nf = n as f64;
    if !(sxx / nf > VARIANCE_EPSILON) || !(syy / nf > VARIANCE_EPSILON) {
        return None;
    }

    let r = sxy / (sxx.sqrt() * syy.sqrt());
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Average ranks (1-based); tied values share the mean of their ranks
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| float_cmp(&values[a], &values[b]));

    let mut result = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // positions i..=j are tied
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            result[idx] = avg;
        }
        i = j + 1;
    }
    result
}

/// Spearman rank correlation, `None` if either array is degenerate
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    pearson(&ranks(x), &ranks(y))
}

/// Correlation statistic used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    Pearson,
    #[default]
    Spearman,
}

impl CorrelationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
        }
    }
}

/// A series held fixed across many correlations (the co-occurrence column).
///
/// Ranks are computed once. Every correlation against co-occurrence in the
/// crate goes through [`FixedSeries::correlate`], so different entry points
/// (plain correlate, subset search, null trials) agree to the last bit.
#[derive(Debug, Clone)]
pub struct FixedSeries {
    values: Vec<f64>,
    ranks: Vec<f64>,
    degenerate: bool,
}

impl FixedSeries {
    pub fn new(values: Vec<f64>) -> Self {
        let ranks = ranks(&values);
        let degenerate = is_degenerate(&values);
        Self {
            values,
            ranks,
            degenerate,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Correlate `x` (same length, same pair order) against this series
    pub fn correlate(&self, x: &[f64], method: CorrelationMethod) -> Option<f64> {
        if self.degenerate || x.len() != self.values.len() {
            return None;
        }
        match method {
            CorrelationMethod::Pearson => pearson(x, &self.values),
            CorrelationMethod::Spearman => pearson(&ranks(x), &self.ranks),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNIFICANCE HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Two-sided p-value for a correlation coefficient via t = r·sqrt((n-2)/(1-r²))
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 || !r.is_finite() {
        return 1.0;
    }
    let r_abs = r.abs().min(1.0);
    if r_abs >= 1.0 - 1e-15 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r_abs * (df / (1.0 - r_abs * r_abs)).sqrt();
    student_t_two_sided(t, df)
}

/// Two-sided Student's t tail probability
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if df <= 0.0 || !t.is_finite() {
        return if t.is_finite() { 1.0 } else { 0.0 };
    }
    let x = df / (df + t * t);
    incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Fisher z-transform, r clamped away from ±1
pub fn fisher_z(r: f64) -> f64 {
    r.clamp(-0.999_999, 0.999_999).atanh()
}

/// Regularized incomplete beta I_x(a, b)
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let bt = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        bt * beta_cf(a, b, x) / a
    } else {
        1.0 - bt * beta_cf(b, a, 1.0 - x) / b
    }
}

/// Lanczos log-gamma
fn ln_gamma(x: f64) -> f64 {
    let c = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let mut y = x;
    let mut tmp = x + 5.5;
    tmp -= (x + 0.5) * tmp.ln();
    let mut ser = 1.000000000190015;

    for coeff in c {
        y += 1.0;
        ser += coeff / y;
    }

    -tmp + (2.5066282746310005 * ser / x).ln()
}

/// Continued fraction for the incomplete beta (modified Lentz)
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;

        // Even step
        let aa = m_f * (b - m_f) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        // Odd step
        let aa = -(a + m_f) * (qab + m_f) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISTRIBUTION SUMMARY — null models, bootstrap, noise trials
// ═══════════════════════════════════════════════════════════════════════════════

/// Summary of a set of per-trial statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullDistribution {
    /// Trials that produced a defined statistic
    pub n_valid: usize,
    /// Trials skipped because the statistic was undefined
    pub n_degenerate: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl NullDistribution {
    pub fn empty() -> Self {
        Self {
            n_valid: 0,
            n_degenerate: 0,
            mean: 0.0,
            std: 0.0,
            min: 0.0,
            max: 0.0,
            p5: 0.0,
            p25: 0.0,
            p50: 0.0,
            p75: 0.0,
            p95: 0.0,
        }
    }

    /// Summarize trial values; `None` entries count as degenerate
    pub fn from_trials(trials: &[Option<f64>]) -> Self {
        let mut valid: Vec<f64> = trials.iter().flatten().copied().collect();
        let n_degenerate = trials.len() - valid.len();
        if valid.is_empty() {
            return Self {
                n_degenerate,
                ..Self::empty()
            };
        }
        valid.sort_by(float_cmp);
        Self {
            n_valid: valid.len(),
            n_degenerate,
            mean: mean(&valid),
            std: std_dev(&valid),
            min: valid[0],
            max: valid[valid.len() - 1],
            p5: percentile_sorted(&valid, 5.0),
            p25: percentile_sorted(&valid, 25.0),
            p50: percentile_sorted(&valid, 50.0),
            p75: percentile_sorted(&valid, 75.0),
            p95: percentile_sorted(&valid, 95.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);

        let y_neg: Vec<f64> = y.iter().map(|v| -v).collect();
        assert!((pearson(&x, &y_neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate_is_none() {
        let x = [1.0, 2.0, 3.0];
        let flat = [4.0, 4.0, 4.0];
        assert_eq!(pearson(&x, &flat), None);
        assert_eq!(spearman(&flat, &x), None);
    }

    #[test]
    fn test_ranks_ties() {
        let r = ranks(&[10.0, 20.0, 20.0, 5.0]);
        assert_eq!(r, vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_spearman_monotone() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [1.0, 4.0, 9.0, 16.0, 25.0, 36.0];
        assert!((spearman(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_p_value_bounds() {
        assert_eq!(correlation_p_value(0.0, 50), 1.0);
        assert!(correlation_p_value(0.9, 50) < 1e-6);
        let p = correlation_p_value(0.3, 30);
        // scipy.stats.pearsonr reference for r=0.3, n=30: p ≈ 0.107
        assert!((p - 0.107).abs() < 0.01, "p = {}", p);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&sorted, 50.0), 3.0);
        assert_eq!(percentile_sorted(&sorted, 25.0), 2.0);
        assert_eq!(percentile_sorted(&sorted, 100.0), 5.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_fixed_series_matches_free_functions() {
        let y = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let x = [0.2, 0.9, 0.1, 0.8, 0.3, 0.05, 0.7, 0.25];
        let series = FixedSeries::new(y.clone());
        assert_eq!(
            series.correlate(&x, CorrelationMethod::Spearman),
            spearman(&x, &y)
        );
        assert_eq!(
            series.correlate(&x, CorrelationMethod::Pearson),
            pearson(&x, &y)
        );
    }

    #[test]
    fn test_null_distribution_counts_degenerate() {
        let trials = [Some(1.0), None, Some(3.0), Some(2.0), None];
        let summary = NullDistribution::from_trials(&trials);
        assert_eq!(summary.n_valid, 3);
        assert_eq!(summary.n_degenerate, 2);
        assert_eq!(summary.p50, 2.0);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 3.0);
    }
}
