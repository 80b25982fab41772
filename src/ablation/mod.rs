//! ═══════════════════════════════════════════════════════════════════════════════
//! ABLATION — Axis Contribution, Robustness, Subset Search
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Which axes earn their place?
//!
//! - Leave-one-out ablation: an axis whose removal strengthens the negative
//!   correlation is harmful and counts against the model
//! - Sensitivity: Gaussian noise on archetype coordinates; the sign of r must
//!   survive
//! - Optimal weights: |per-axis r| with harmful axes zeroed
//! - Subset search: every axis combination between two dimensionalities
//! - Baseline: the simpler model the full model has to beat
//! ═══════════════════════════════════════════════════════════════════════════════

pub mod axis;
pub mod baseline;
pub mod search;
pub mod sensitivity;
pub mod weights;

pub use axis::{axis_ablation, axis_ablation_weighted, AblationReport, AblationResult, Impact};
pub use baseline::{
    baseline_model, compare_to_baseline, BaselineComparison, BaselineKind, BaselineModel,
};
pub use search::{
    combinations, dimensionality_search, dimensionality_search_with, DimensionResult,
    PairDistanceCache, SearchOptions, SearchProgress, SearchReport, SubsetResult,
};
pub use sensitivity::{coordinate_sensitivity, coordinate_sensitivity_with, SensitivityReport};
pub use weights::{optimal_weights, optimal_weights_from, OptimalWeights};
