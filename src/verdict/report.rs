//! Tiered verdict from the four criteria, plus the optimized-weights variant.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::criteria::{
    evaluate_ablation, evaluate_baseline, evaluate_robustness, evaluate_significance,
    FalsificationCriterion,
};
use crate::ablation::{AblationReport, BaselineComparison, SensitivityReport};
use crate::config::VerdictCriteria;
use crate::engine::AxisWeights;
use crate::outcome::Analysis;
use crate::significance::{MantelReport, PermutationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "SURVIVES")]
    Survives,
    #[serde(rename = "MOSTLY SURVIVES")]
    MostlySurvives,
    #[serde(rename = "PARTIALLY SURVIVES")]
    PartiallySurvives,
    #[serde(rename = "FAILS")]
    Fails,
}

impl Verdict {
    /// 4 → survives, 3 → mostly, 2 → partially, fewer → fails
    pub fn from_pass_count(passed: usize) -> Self {
        match passed {
            n if n >= 4 => Verdict::Survives,
            3 => Verdict::MostlySurvives,
            2 => Verdict::PartiallySurvives,
            _ => Verdict::Fails,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Survives => "SURVIVES",
            Verdict::MostlySurvives => "MOSTLY SURVIVES",
            Verdict::PartiallySurvives => "PARTIALLY SURVIVES",
            Verdict::Fails => "FAILS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Verdict::Survives => "All falsification criteria passed. The coordinate model survives this test.",
            Verdict::MostlySurvives => "One criterion failed. The model survives with a named weakness.",
            Verdict::PartiallySurvives => "Two criteria failed. Parts of the model are not supported.",
            Verdict::Fails => "Fewer than two criteria passed. The coordinate model is falsified on this corpus.",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream analyses the criteria read
#[derive(Debug, Clone, Copy)]
pub struct VerdictInputs<'a> {
    pub permutation: &'a Analysis<PermutationReport>,
    pub mantel: &'a Analysis<MantelReport>,
    pub baseline: &'a Analysis<BaselineComparison>,
    pub ablation: &'a Analysis<AblationReport>,
    pub sensitivity: &'a Analysis<SensitivityReport>,
}

/// The weighted model's replacements for criteria 2 and 3
#[derive(Debug, Clone, Copy)]
pub struct OptimizedInputs<'a> {
    pub weights: &'a AxisWeights,
    pub baseline: &'a Analysis<BaselineComparison>,
    pub ablation: &'a Analysis<AblationReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedVerdict {
    pub weights: AxisWeights,
    pub criteria: Vec<FalsificationCriterion>,
    pub n_passed: usize,
    pub verdict: Verdict,
    /// n_passed(optimized) − n_passed(uniform)
    pub pass_change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictReport {
    pub thresholds: VerdictCriteria,
    /// In criterion order 1–4
    pub criteria: Vec<FalsificationCriterion>,
    pub n_passed: usize,
    pub n_criteria: usize,
    pub verdict: Verdict,
    pub summary: String,
    /// Failed criteria and ablation concerns
    pub concerns: Vec<String>,
    pub optimized: Option<OptimizedVerdict>,
}

impl VerdictReport {
    pub fn criterion(&self, index: usize) -> Option<&FalsificationCriterion> {
        self.criteria.get(index)
    }
}

fn count_passed(criteria: &[FalsificationCriterion]) -> usize {
    criteria.iter().filter(|c| c.passed).count()
}

/// Evaluate all four criteria and classify
pub fn synthesize_verdict(inputs: &VerdictInputs<'_>, thresholds: &VerdictCriteria) -> VerdictReport {
    let criteria = vec![
        evaluate_significance(inputs.permutation, inputs.mantel, thresholds.alpha),
        evaluate_baseline(inputs.baseline),
        evaluate_ablation(inputs.ablation),
        evaluate_robustness(inputs.sensitivity, thresholds.robust_threshold),
    ];
    let n_passed = count_passed(&criteria);
    let verdict = Verdict::from_pass_count(n_passed);

    let mut concerns: Vec<String> = criteria
        .iter()
        .filter(|c| !c.passed)
        .map(|c| format!("{}: {}", c.name, c.evidence))
        .collect();
    if let Some(a) = inputs.ablation.success() {
        concerns.extend(a.concerns.iter().cloned());
    }

    info!(verdict = verdict.as_str(), n_passed, "falsification verdict");

    VerdictReport {
        thresholds: thresholds.clone(),
        n_criteria: criteria.len(),
        summary: format!("{} ({}/{} criteria passed)", verdict, n_passed, criteria.len()),
        criteria,
        n_passed,
        verdict,
        concerns,
        optimized: None,
    }
}

/// Verdict for the uniform model plus the weighted variant, which swaps in
/// its own baseline comparison (2) and ablation (3)
pub fn synthesize_with_optimized(
    inputs: &VerdictInputs<'_>,
    optimized: &OptimizedInputs<'_>,
    thresholds: &VerdictCriteria,
) -> VerdictReport {
    let mut report = synthesize_verdict(inputs, thresholds);

    let criteria = vec![
        report.criteria[0].clone(),
        evaluate_baseline(optimized.baseline),
        evaluate_ablation(optimized.ablation),
        report.criteria[3].clone(),
    ];
    let n_passed = count_passed(&criteria);
    let pass_change = n_passed as i64 - report.n_passed as i64;
    info!(n_passed, pass_change, "optimized-weights verdict");

    report.optimized = Some(OptimizedVerdict {
        weights: *optimized.weights,
        verdict: Verdict::from_pass_count(n_passed),
        criteria,
        n_passed,
        pass_change,
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ablation::{BaselineKind, BaselineModel};
    use crate::engine::Axis;
    use crate::stats::{CorrelationMethod, NullDistribution};

    #[test]
    fn test_tiers() {
        assert_eq!(Verdict::from_pass_count(4), Verdict::Survives);
        assert_eq!(Verdict::from_pass_count(3), Verdict::MostlySurvives);
        assert_eq!(Verdict::from_pass_count(2), Verdict::PartiallySurvives);
        assert_eq!(Verdict::from_pass_count(1), Verdict::Fails);
        assert_eq!(Verdict::from_pass_count(0), Verdict::Fails);
        assert_eq!(
            serde_json::to_string(&Verdict::MostlySurvives).unwrap(),
            "\"MOSTLY SURVIVES\""
        );
    }

    fn ablation(harmful: Vec<Axis>) -> Analysis<AblationReport> {
        Analysis::Success(AblationReport {
            method: CorrelationMethod::Spearman,
            weights: AxisWeights::uniform(),
            r_full: -0.4,
            harmful_threshold: 0.005,
            axes: Vec::new(),
            concerns: harmful.iter().map(|a| format!("{} is harmful", a)).collect(),
            harmful,
        })
    }

    fn comparison(model_r: f64) -> Analysis<BaselineComparison> {
        Analysis::Success(BaselineComparison::new(
            model_r,
            BaselineModel {
                kind: BaselineKind::BestSingleAxis,
                r: -0.3,
                label: "best single axis".into(),
                n_trials: None,
            },
        ))
    }

    #[test]
    fn test_all_errored_fails() {
        let perm: Analysis<PermutationReport> = Analysis::insufficient_pairs(4);
        let mantel: Analysis<MantelReport> = Analysis::insufficient_pairs(4);
        let baseline: Analysis<BaselineComparison> = Analysis::insufficient_pairs(4);
        let abl: Analysis<AblationReport> = Analysis::insufficient_pairs(4);
        let sens: Analysis<SensitivityReport> = Analysis::insufficient_pairs(4);
        let inputs = VerdictInputs {
            permutation: &perm,
            mantel: &mantel,
            baseline: &baseline,
            ablation: &abl,
            sensitivity: &sens,
        };
        let report = synthesize_verdict(&inputs, &VerdictCriteria::default());
        assert_eq!(report.n_passed, 0);
        assert_eq!(report.verdict, Verdict::Fails);
        assert_eq!(report.concerns.len(), 4);
    }

    #[test]
    fn test_optimized_variant_reports_change() {
        let perm = Analysis::Success(PermutationReport {
            method: CorrelationMethod::Spearman,
            observed_r: -0.4,
            p_value: 0.001,
            z_score: -4.0,
            n_trials: 1000,
            seed: 42,
            null: NullDistribution::empty(),
        });
        let mantel: Analysis<MantelReport> = Analysis::degenerate("flat");
        let baseline = comparison(-0.2);
        let abl = ablation(vec![Axis::VoluntaryFated]);
        let sens = Analysis::Success(SensitivityReport {
            method: CorrelationMethod::Spearman,
            sigma: 0.05,
            n_trials: 100,
            seed: 1,
            observed_r: -0.4,
            n_preserved: 99,
            robustness: 0.99,
            robust: true,
            sign_margin: 0.01,
            robust_threshold: 0.95,
            distribution: NullDistribution::empty(),
        });
        let inputs = VerdictInputs {
            permutation: &perm,
            mantel: &mantel,
            baseline: &baseline,
            ablation: &abl,
            sensitivity: &sens,
        };
        let criteria = VerdictCriteria::default();

        // model r = -0.2 loses to the baseline's -0.3, and one axis is harmful
        let base = synthesize_verdict(&inputs, &criteria);
        assert_eq!(base.n_passed, 2);
        assert_eq!(base.verdict, Verdict::PartiallySurvives);
        assert!(base.concerns.iter().any(|c| c.contains("harmful")));

        let weights = AxisWeights::without(Axis::VoluntaryFated);
        let opt_baseline = comparison(-0.45);
        let opt_ablation = ablation(Vec::new());
        let optimized = OptimizedInputs {
            weights: &weights,
            baseline: &opt_baseline,
            ablation: &opt_ablation,
        };
        let report = synthesize_with_optimized(&inputs, &optimized, &criteria);
        let opt = report.optimized.unwrap();
        assert_eq!(opt.n_passed, 4);
        assert_eq!(opt.verdict, Verdict::Survives);
        assert_eq!(opt.pass_change, 2);
        assert_eq!(report.verdict, Verdict::PartiallySurvives);
    }
}
