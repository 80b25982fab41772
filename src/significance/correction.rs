//! Multiple-comparison correction over named p-values.

use serde::{Deserialize, Serialize};

use crate::outcome::Analysis;
use crate::stats::float_cmp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    Bonferroni,
    BenjaminiHochberg,
}

/// One named test after correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedTest {
    pub name: String,
    pub p_value: f64,
    pub adjusted_p: f64,
    /// adjusted_p ≤ alpha
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub method: CorrectionMethod,
    pub alpha: f64,
    pub n_tests: usize,
    pub n_significant: usize,
    /// In input order
    pub tests: Vec<CorrectedTest>,
}

impl CorrectionReport {
    pub fn get(&self, name: &str) -> Option<&CorrectedTest> {
        self.tests.iter().find(|t| t.name == name)
    }

    pub fn significant_names(&self) -> Vec<&str> {
        self.tests
            .iter()
            .filter(|t| t.significant)
            .map(|t| t.name.as_str())
            .collect()
    }
}

fn check_inputs<S: AsRef<str>>(p_values: &[(S, f64)], alpha: f64) -> Option<Analysis<CorrectionReport>> {
    if p_values.is_empty() {
        return Some(Analysis::insufficient("No p-values to correct", 1, 0));
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Some(Analysis::invalid(format!("alpha {} outside (0, 1)", alpha)));
    }
    p_values
        .iter()
        .find(|(_, p)| !(0.0..=1.0).contains(p))
        .map(|(name, p)| Analysis::invalid(format!("p-value for '{}' is {}", name.as_ref(), p)))
}

fn assemble<S: AsRef<str>>(
    method: CorrectionMethod,
    p_values: &[(S, f64)],
    adjusted: Vec<f64>,
    alpha: f64,
) -> CorrectionReport {
    let tests: Vec<CorrectedTest> = p_values
        .iter()
        .zip(adjusted)
        .map(|((name, p), adjusted_p)| CorrectedTest {
            name: name.as_ref().to_string(),
            p_value: *p,
            adjusted_p,
            significant: adjusted_p <= alpha,
        })
        .collect();
    CorrectionReport {
        method,
        alpha,
        n_tests: tests.len(),
        n_significant: tests.iter().filter(|t| t.significant).count(),
        tests,
    }
}

/// Family-wise correction: adjusted p = min(1, p·m)
pub fn bonferroni<S: AsRef<str>>(p_values: &[(S, f64)], alpha: f64) -> Analysis<CorrectionReport> {
    if let Some(rejected) = check_inputs(p_values, alpha) {
        return rejected;
    }
    let m = p_values.len() as f64;
    let adjusted = p_values.iter().map(|(_, p)| (p * m).min(1.0)).collect();
    Analysis::Success(assemble(CorrectionMethod::Bonferroni, p_values, adjusted, alpha))
}

/// False-discovery-rate step-up procedure.
///
/// Sorted ascending, adjusted p_(i) = min over j ≥ i of p_(j)·m/j, capped at 1.
pub fn benjamini_hochberg<S: AsRef<str>>(
    p_values: &[(S, f64)],
    alpha: f64,
) -> Analysis<CorrectionReport> {
    if let Some(rejected) = check_inputs(p_values, alpha) {
        return rejected;
    }
    let m = p_values.len();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| float_cmp(&p_values[a].1, &p_values[b].1).then(a.cmp(&b)));

    let mut adjusted = vec![1.0; m];
    let mut running = 1.0_f64;
    for (rank, &idx) in order.iter().enumerate().rev() {
        let scaled = p_values[idx].1 * m as f64 / (rank + 1) as f64;
        running = running.min(scaled);
        adjusted[idx] = running.min(1.0);
    }
    Analysis::Success(assemble(CorrectionMethod::BenjaminiHochberg, p_values, adjusted, alpha))
}
