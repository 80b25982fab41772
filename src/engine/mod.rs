//! ═══════════════════════════════════════════════════════════════════════════════
//! ENGINE — Distance & Correlation
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Builds the analysis corpus (every unordered entity pair with its coordinate
//! distance and co-occurrence count) and correlates the two columns.
//!
//! The hypothesis predicts a NEGATIVE correlation: entities whose archetypes
//! sit close together in the 8-axis space co-occur more often.
//! ═══════════════════════════════════════════════════════════════════════════════

pub mod cooccurrence;
pub mod coordinates;
pub mod correlation;
pub mod corpus;
pub mod distance;

pub use cooccurrence::{CooccurrenceCache, CooccurrenceEntry, CooccurrenceProvider, CooccurrenceTable};
pub use coordinates::{Axis, AxisWeights, CoordinateVector, EntityArchetypeBinding, N_AXES};
pub use correlation::{
    correlate, correlate_series, per_axis_correlation, AxisCorrelation, CorrelationReport,
    PerAxisReport,
};
pub use corpus::{
    build_corpus, ArchetypePoint, Corpus, CorpusBuilder, CorpusEntity, CorpusSummary,
    PairObservation,
};
pub use distance::{
    cosine_over, distance, euclidean_from_squared, squared_differences, DistanceMetric,
};
