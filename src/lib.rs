//! ═══════════════════════════════════════════════════════════════════════════════
//! MYTHOS — Archetype Coordinate Falsification Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//! Tests one hypothesis: mythological entities whose archetypes sit close in
//! an 8-axis coordinate space co-occur more often in the source texts.
//! Every routine either returns a value or says why it could not.
//! ═══════════════════════════════════════════════════════════════════════════════

#![allow(clippy::too_many_arguments)] // Statistical routines carry their knobs explicitly
#![allow(clippy::needless_range_loop)] // Indexed loops clearer for pair matrices
#![allow(clippy::doc_lazy_continuation)]

// ═══════════════════════════════════════════════════════════════════════════════
// FOUNDATION — errors, outcomes, settings, statistics
// ═══════════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod outcome;
pub mod stats;
pub mod trials;

// ═══════════════════════════════════════════════════════════════════════════════
// ANALYSIS
// ═══════════════════════════════════════════════════════════════════════════════

pub mod ablation;
pub mod calibration;
pub mod engine;
pub mod significance;
pub mod verdict;

// ═══════════════════════════════════════════════════════════════════════════════
// INPUT & ORCHESTRATION
// ═══════════════════════════════════════════════════════════════════════════════

pub mod pipeline;
pub mod snapshot;
pub mod synthetic;

pub use config::{AnalysisConfig, VerdictCriteria};
pub use error::{MythosError, MythosResult};
pub use outcome::{Analysis, MIN_PAIRS};
pub use pipeline::{analyze_snapshot, run_analysis, FullReport};
pub use snapshot::Snapshot;
pub use verdict::{Verdict, VerdictReport};
