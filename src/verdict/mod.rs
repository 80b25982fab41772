//! ═══════════════════════════════════════════════════════════════════════════════
//! VERDICT — Falsification Synthesis
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Four pre-registered criteria:
//!   1. Significant: permutation p < α OR Mantel p < α
//!   2. Beats the declared simpler baseline
//!   3. No harmful axis under ablation
//!   4. Sign robust to coordinate noise
//!
//! Tier by pass count: 4 SURVIVES, 3 MOSTLY SURVIVES, 2 PARTIALLY SURVIVES,
//! otherwise FAILS. Missing or errored input is a failed criterion.
//! ═══════════════════════════════════════════════════════════════════════════════

pub mod criteria;
pub mod report;

pub use criteria::{
    evaluate_ablation, evaluate_baseline, evaluate_robustness, evaluate_significance,
    CriterionId, FalsificationCriterion,
};
pub use report::{
    synthesize_verdict, synthesize_with_optimized, OptimizedInputs, OptimizedVerdict, Verdict,
    VerdictInputs, VerdictReport,
};
