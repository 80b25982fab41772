//! ═══════════════════════════════════════════════════════════════════════════════
//! SNAPSHOT — Input Document
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! One JSON document holds everything a run consumes:
//!
//! ```json
//! {
//!   "bindings": [{"entity_id": "zeus", "archetype_id": "sky_father",
//!                 "coordinates": [0.2, 0.7, ...], "tradition": "hellenic"}],
//!   "cooccurrence": [{"entity_a": "zeus", "entity_b": "hera", "count": 41}],
//!   "segments": [["zeus", "hera", "athena"]],
//!   "exclude": ["pan"]
//! }
//! ```
//!
//! `cooccurrence` rows and per-segment membership are summed into one table.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::engine::{
    CooccurrenceEntry, CooccurrenceTable, Corpus, CorpusBuilder, DistanceMetric,
    EntityArchetypeBinding,
};
use crate::error::{MythosResult, ValidationError};
use crate::outcome::Analysis;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub bindings: Vec<EntityArchetypeBinding>,
    #[serde(default)]
    pub cooccurrence: Vec<CooccurrenceEntry>,
    /// Entity lists per text segment; each co-present pair counts once
    #[serde(default)]
    pub segments: Vec<Vec<String>>,
    /// Entity ids to drop (known false-positive matches)
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Snapshot {
    pub fn from_json(text: &str) -> MythosResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn from_file(path: &Path) -> MythosResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_file(&self, path: &Path) -> MythosResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bindings.is_empty() {
            return Err(ValidationError::InvalidInput {
                field: "bindings".into(),
                message: "no bindings".into(),
            });
        }
        if let Some(b) = self
            .bindings
            .iter()
            .find(|b| b.entity_id.trim().is_empty() || b.archetype_id.trim().is_empty())
        {
            return Err(ValidationError::InvalidInput {
                field: "bindings".into(),
                message: format!(
                    "empty id in binding '{}' → '{}'",
                    b.entity_id, b.archetype_id
                ),
            });
        }
        if let Some(e) = self
            .cooccurrence
            .iter()
            .find(|e| e.entity_a.trim().is_empty() || e.entity_b.trim().is_empty())
        {
            return Err(ValidationError::InvalidInput {
                field: "cooccurrence".into(),
                message: format!("empty entity id in row with count {}", e.count),
            });
        }
        Ok(())
    }

    /// Table combining explicit rows and segment membership
    pub fn table(&self) -> CooccurrenceTable {
        let mut table = CooccurrenceTable::from_entries(&self.cooccurrence);
        table.merge(&CooccurrenceTable::from_segments(&self.segments));
        table
    }

    pub fn exclusions(&self) -> HashSet<String> {
        self.exclude.iter().cloned().collect()
    }

    pub fn build_corpus(&self, metric: DistanceMetric) -> Analysis<Corpus> {
        let table = self.table();
        debug!(
            bindings = self.bindings.len(),
            table_pairs = table.len(),
            excluded = self.exclude.len(),
            "building corpus from snapshot"
        );
        let mut builder = CorpusBuilder::new(&table)
            .exclude(self.exclusions())
            .metric(metric);
        builder.build(&self.bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CooccurrenceProvider;

    const DOC: &str = r#"{
        "bindings": [
            {"entity_id": "zeus", "archetype_id": "sky_father",
             "coordinates": [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8], "tradition": "hellenic"},
            {"entity_id": "odin", "archetype_id": "sky_father",
             "coordinates": [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]},
            {"entity_id": "pan", "archetype_id": "wild"}
        ],
        "cooccurrence": [{"entity_a": "zeus", "entity_b": "odin", "count": 2}],
        "segments": [["odin", "zeus"], ["zeus", "odin", "zeus"]],
        "exclude": ["pan"]
    }"#;

    #[test]
    fn test_parse_and_merge_counts() {
        let snapshot = Snapshot::from_json(DOC).unwrap();
        assert_eq!(snapshot.bindings.len(), 3);
        assert_eq!(snapshot.bindings[2].coordinates, None);
        assert_eq!(snapshot.table().count("odin", "zeus"), 4);
        assert!(snapshot.exclusions().contains("pan"));
    }

    #[test]
    fn test_out_of_range_coordinate_rejected() {
        let doc = r#"{"bindings": [{"entity_id": "x", "archetype_id": "y",
            "coordinates": [1.5, 0, 0, 0, 0, 0, 0, 0]}]}"#;
        assert!(Snapshot::from_json(doc).is_err());
    }

    #[test]
    fn test_empty_bindings_rejected() {
        let err = Snapshot::from_json(r#"{"bindings": []}"#).unwrap_err();
        assert!(err.to_string().contains("bindings"));
    }

    #[test]
    fn test_too_small_corpus_is_a_value() {
        let snapshot = Snapshot::from_json(DOC).unwrap();
        let outcome = snapshot.build_corpus(DistanceMetric::Euclidean);
        assert_eq!(outcome.reason(), Some("Insufficient pairs"));
    }
}
