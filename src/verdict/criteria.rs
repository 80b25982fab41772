//! The four falsification criteria, each evaluated on its own.
//!
//! A criterion whose upstream analysis errored or is missing fails. There is
//! no partial credit and no "not applicable".

use serde::{Deserialize, Serialize};

use crate::ablation::{AblationReport, BaselineComparison, SensitivityReport};
use crate::outcome::Analysis;
use crate::significance::{MantelReport, PermutationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionId {
    Significance,
    BeatsBaseline,
    NoHarmfulAxes,
    Robustness,
}

impl CriterionId {
    pub const ALL: [CriterionId; 4] = [
        CriterionId::Significance,
        CriterionId::BeatsBaseline,
        CriterionId::NoHarmfulAxes,
        CriterionId::Robustness,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CriterionId::Significance => "Correlation is significant",
            CriterionId::BeatsBaseline => "Model beats the simpler baseline",
            CriterionId::NoHarmfulAxes => "No axis is harmful",
            CriterionId::Robustness => "Sign survives coordinate noise",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CriterionId::Significance => {
                "Permutation p or Mantel p below alpha for a negative distance/co-occurrence correlation"
            }
            CriterionId::BeatsBaseline => {
                "The full model's correlation is more negative than the declared baseline's"
            }
            CriterionId::NoHarmfulAxes => {
                "Removing any single axis must not strengthen the correlation beyond the threshold"
            }
            CriterionId::Robustness => {
                "The fraction of noise trials keeping the observed sign meets the robustness threshold"
            }
        }
    }
}

/// One named, thresholded pass/fail test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsificationCriterion {
    pub id: CriterionId,
    pub name: String,
    pub passed: bool,
    /// Human-readable numbers behind the decision
    pub evidence: String,
    /// Set when the upstream analysis did not produce a value
    pub error: Option<String>,
}

impl FalsificationCriterion {
    fn decided(id: CriterionId, passed: bool, evidence: String) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            passed,
            evidence,
            error: None,
        }
    }

    fn errored<T>(id: CriterionId, upstream: &str, outcome: &Analysis<T>) -> Self {
        let reason = outcome.reason().unwrap_or("missing").to_string();
        Self {
            id,
            name: id.name().to_string(),
            passed: false,
            evidence: format!("{} unavailable: {}", upstream, reason),
            error: Some(reason),
        }
    }
}

/// Criterion 1: permutation p < alpha OR Mantel p < alpha; an errored test
/// does not contribute, both errored fails.
pub fn evaluate_significance(
    permutation: &Analysis<PermutationReport>,
    mantel: &Analysis<MantelReport>,
    alpha: f64,
) -> FalsificationCriterion {
    let id = CriterionId::Significance;
    match (permutation.success(), mantel.success()) {
        (None, None) => {
            let mut c = FalsificationCriterion::errored(id, "permutation and Mantel tests", permutation);
            if let Some(m) = mantel.reason() {
                c.evidence.push_str(&format!("; Mantel: {}", m));
            }
            c
        }
        (perm, mant) => {
            let perm_pass = perm.map(|p| p.is_significant(alpha)).unwrap_or(false);
            let mant_pass = mant.map(|m| m.p_one_sided < alpha).unwrap_or(false);
            let describe = |label: &str, p: Option<f64>, r: Option<f64>| match (p, r) {
                (Some(p), Some(r)) => format!("{} r = {:.4}, p = {:.4}", label, r, p),
                _ => format!("{} unavailable", label),
            };
            let evidence = format!(
                "{}; {} (alpha = {})",
                describe("permutation", perm.map(|p| p.p_value), perm.map(|p| p.observed_r)),
                describe("Mantel", mant.map(|m| m.p_one_sided), mant.map(|m| m.observed_r)),
                alpha
            );
            FalsificationCriterion::decided(id, perm_pass || mant_pass, evidence)
        }
    }
}

/// Criterion 2: model r strictly more negative than the baseline r
pub fn evaluate_baseline(comparison: &Analysis<BaselineComparison>) -> FalsificationCriterion {
    let id = CriterionId::BeatsBaseline;
    match comparison.success() {
        Some(c) => FalsificationCriterion::decided(
            id,
            c.model_better,
            format!(
                "model r = {:.4} vs {} r = {:.4} (margin {:+.4})",
                c.model_r, c.baseline.label, c.baseline.r, c.margin
            ),
        ),
        None => FalsificationCriterion::errored(id, "baseline comparison", comparison),
    }
}

/// Criterion 3: no harmful axis
pub fn evaluate_ablation(ablation: &Analysis<AblationReport>) -> FalsificationCriterion {
    let id = CriterionId::NoHarmfulAxes;
    match ablation.success() {
        Some(a) if a.harmful.is_empty() => FalsificationCriterion::decided(
            id,
            true,
            format!("no axis exceeds the harmful threshold {}", a.harmful_threshold),
        ),
        Some(a) => {
            let names: Vec<&str> = a.harmful.iter().map(|x| x.name()).collect();
            FalsificationCriterion::decided(
                id,
                false,
                format!("harmful axes: {}", names.join(", ")),
            )
        }
        None => FalsificationCriterion::errored(id, "axis ablation", ablation),
    }
}

/// Criterion 4: robustness ≥ threshold
pub fn evaluate_robustness(
    sensitivity: &Analysis<SensitivityReport>,
    robust_threshold: f64,
) -> FalsificationCriterion {
    let id = CriterionId::Robustness;
    match sensitivity.success() {
        Some(s) => FalsificationCriterion::decided(
            id,
            s.robustness >= robust_threshold,
            format!(
                "{}/{} noise trials (σ = {}) kept the sign: {:.3} vs threshold {}",
                s.n_preserved, s.n_trials, s.sigma, s.robustness, robust_threshold
            ),
        ),
        None => FalsificationCriterion::errored(id, "sensitivity analysis", sensitivity),
    }
}
