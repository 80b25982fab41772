//! ═══════════════════════════════════════════════════════════════════════════════
//! CALIBRATION — Coordinate Fitting & Generalization
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Nudges archetype coordinates toward distances implied by co-occurrence,
//! within a bounded shift, and checks whether the adjustment generalizes:
//!
//! - k-fold over pairs
//! - leave-one-tradition-out, the stronger test since it crosses a cultural
//!   boundary instead of sampling random pairs
//!
//! A calibration that only improves the training pairs is overfitting, not
//! evidence for the model.
//! ═══════════════════════════════════════════════════════════════════════════════

pub mod cross_validation;
pub mod descent;
pub mod holdout;
pub mod target;

pub use cross_validation::{cross_validate, fold_assignment, CrossValidationReport, FoldResult};
pub use descent::{
    calibrate, calibrate_corpus, calibrate_pairs, BoundViolations, CalibrationResult,
    CalibrationRun, CalibrationState, DescentSummary, StopReason,
};
pub use holdout::{holdout_all_traditions, holdout_tradition, HoldoutReport, HoldoutSweep};
pub use target::{target_distance, target_distances};
