//! ═══════════════════════════════════════════════════════════════════════════════
//! CONFIG — Analysis Settings and Pre-registered Thresholds
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! One JSON document drives a run. Every field has a default, so a partial
//! file only overrides what it names.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ablation::BaselineKind;
use crate::engine::AxisWeights;
use crate::error::{ConfigError, MythosResult};
use crate::stats::CorrelationMethod;

/// Main analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Master seed; each resampling routine derives its own stream from it
    pub seed: u64,

    /// Dispatch trials and subsets on the rayon pool
    pub parallel: bool,

    /// Statistic used by permutation, ablation, sensitivity and search
    pub method: CorrelationMethod,

    pub significance: SignificanceConfig,
    pub calibration: CalibrationConfig,
    pub ablation: AblationConfig,
    pub search: SearchConfig,

    /// Pre-registered falsification thresholds
    pub criteria: VerdictCriteria,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            parallel: true,
            method: CorrelationMethod::Spearman,
            significance: SignificanceConfig::default(),
            calibration: CalibrationConfig::default(),
            ablation: AblationConfig::default(),
            search: SearchConfig::default(),
            criteria: VerdictCriteria::default(),
        }
    }
}

/// Null-model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignificanceConfig {
    pub permutation_trials: usize,
    pub mantel_trials: usize,
    pub bootstrap_resamples: usize,
    /// Bootstrap interval coverage
    pub confidence: f64,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            permutation_trials: 1000,
            mantel_trials: 1000,
            bootstrap_resamples: 1000,
            confidence: 0.95,
        }
    }
}

/// Gradient-descent calibration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub learning_rate: f64,
    pub max_steps: usize,
    /// Maximum cumulative shift of any coordinate from its original value
    pub max_shift: f64,
    /// Stop when |Δloss| falls below this
    pub tolerance: f64,
    pub axis_weights: AxisWeights,
    /// Folds for cross-validation
    pub cv_folds: usize,
    /// Pairs per partial gradient accumulator
    pub chunk_size: usize,
    /// Accumulate chunks on the rayon pool (result is identical either way)
    pub parallel: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            max_steps: 500,
            max_shift: 0.15,
            tolerance: 1e-9,
            axis_weights: AxisWeights::uniform(),
            cv_folds: 5,
            chunk_size: 512,
            parallel: true,
        }
    }
}

/// Ablation / sensitivity / baseline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AblationConfig {
    /// Gaussian σ added to every coordinate in sensitivity trials
    pub noise_sigma: f64,
    pub noise_trials: usize,
    /// Declared simpler model for falsification criterion 2
    pub baseline: BaselineKind,
    /// Draws for the random-coordinates baseline
    pub baseline_trials: usize,
}

impl Default for AblationConfig {
    fn default() -> Self {
        Self {
            noise_sigma: 0.05,
            noise_trials: 200,
            baseline: BaselineKind::BestSingleAxis,
            baseline_trials: 100,
        }
    }
}

/// Dimensionality search bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub min_dims: usize,
    pub max_dims: usize,
    pub top_n: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_dims: 3,
            max_dims: 7,
            top_n: 10,
        }
    }
}

/// Pre-registered falsification thresholds.
///
/// These encode the hypothesis, not detector sensitivity. Set them before
/// looking at results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictCriteria {
    /// Significance level for criterion 1 and the multiple-comparison step
    pub alpha: f64,
    /// An axis is harmful when removing it lowers r by more than this
    pub harmful_threshold: f64,
    /// Minimum fraction of noise trials that must keep the observed sign
    pub robust_threshold: f64,
    /// |r| a noise trial must keep to count as preserving the sign
    pub sign_margin: f64,
}

impl Default for VerdictCriteria {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            harmful_threshold: 0.005,
            robust_threshold: 0.95,
            sign_margin: 0.01,
        }
    }
}

impl VerdictCriteria {
    /// Conservative thresholds
    pub fn strict() -> Self {
        Self {
            alpha: 0.01,
            harmful_threshold: 0.002,
            robust_threshold: 0.99,
            sign_margin: 0.05,
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file and validate
    pub fn from_file(path: &Path) -> MythosResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let text = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside their domain
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_open = |v: f64| v > 0.0 && v < 1.0;

        if !unit_open(self.criteria.alpha) {
            return Err(ConfigError::invalid("criteria.alpha", "must be in (0, 1)"));
        }
        if !(self.criteria.harmful_threshold >= 0.0) {
            return Err(ConfigError::invalid("criteria.harmful_threshold", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.criteria.robust_threshold) {
            return Err(ConfigError::invalid("criteria.robust_threshold", "must be in [0, 1]"));
        }
        if !(self.criteria.sign_margin >= 0.0) {
            return Err(ConfigError::invalid("criteria.sign_margin", "must be >= 0"));
        }

        let s = &self.significance;
        if s.permutation_trials == 0 || s.mantel_trials == 0 || s.bootstrap_resamples == 0 {
            return Err(ConfigError::invalid("significance", "trial counts must be > 0"));
        }
        if !unit_open(s.confidence) {
            return Err(ConfigError::invalid("significance.confidence", "must be in (0, 1)"));
        }

        let c = &self.calibration;
        if !(c.learning_rate > 0.0) || !c.learning_rate.is_finite() {
            return Err(ConfigError::invalid("calibration.learning_rate", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&c.max_shift) {
            return Err(ConfigError::invalid("calibration.max_shift", "must be in [0, 1]"));
        }
        if !c.axis_weights.is_valid() {
            return Err(ConfigError::invalid(
                "calibration.axis_weights",
                "weights must be finite, non-negative, not all zero",
            ));
        }
        if c.cv_folds < 2 {
            return Err(ConfigError::invalid("calibration.cv_folds", "must be >= 2"));
        }
        if c.chunk_size == 0 {
            return Err(ConfigError::invalid("calibration.chunk_size", "must be > 0"));
        }

        let a = &self.ablation;
        if !(a.noise_sigma >= 0.0) {
            return Err(ConfigError::invalid("ablation.noise_sigma", "must be >= 0"));
        }
        if a.noise_trials == 0 || a.baseline_trials == 0 {
            return Err(ConfigError::invalid("ablation", "trial counts must be > 0"));
        }

        let r = &self.search;
        if r.min_dims == 0 || r.min_dims > r.max_dims || r.max_dims > crate::engine::N_AXES {
            return Err(ConfigError::invalid(
                "search",
                "need 1 <= min_dims <= max_dims <= 8",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
        let strict = AnalysisConfig {
            criteria: VerdictCriteria::strict(),
            ..AnalysisConfig::default()
        };
        assert!(strict.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{"seed": 7, "criteria": {"robust_threshold": 0.9}}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.criteria.robust_threshold, 0.9);
        assert_eq!(config.criteria.harmful_threshold, 0.005);
        assert_eq!(config.significance.permutation_trials, 1000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AnalysisConfig::default();
        config.calibration.cv_folds = 1;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.search.min_dims = 5;
        config.search.max_dims = 4;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.criteria.alpha = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("criteria.alpha"));
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/mythos.json")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
