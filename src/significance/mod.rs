//! ═══════════════════════════════════════════════════════════════════════════════
//! SIGNIFICANCE — Null Models, Intervals, Multiple Comparisons
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Is the observed negative correlation distinguishable from chance?
//!
//! - Permutation: coordinate vectors reassigned among entities
//! - Mantel: distance-matrix labels permuted jointly (Pearson statistic)
//! - Bootstrap: pairs resampled with replacement, percentile interval
//! - Bonferroni / Benjamini–Hochberg over named p-values
//! - Effect size: r², Fisher z, Cohen's q, magnitude band
//!
//! All resampling routines draw trial `t` from stream `t` of a ChaCha8
//! generator keyed by the caller's seed.
//! ═══════════════════════════════════════════════════════════════════════════════

pub mod bootstrap;
pub mod correction;
pub mod effect;
pub mod mantel;
pub mod permutation;
pub mod traditions;

pub use bootstrap::{bootstrap_ci, bootstrap_ci_with, BootstrapInterval, BootstrapReport};
pub use correction::{
    benjamini_hochberg, bonferroni, CorrectedTest, CorrectionMethod, CorrectionReport,
};
pub use effect::{effect_size, effect_size_with, EffectSize, Magnitude};
pub use mantel::{mantel_test, mantel_test_with, MantelReport};
pub use permutation::{permutation_test, permutation_test_with, PermutationReport};
pub use traditions::{tradition_significance, SkippedTradition, TraditionReport, TraditionResult};
