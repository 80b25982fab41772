//! ═══════════════════════════════════════════════════════════════════════════════
//! SYNTHETIC — Planted Corpora
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Corpora with a known answer: co-occurrence falls monotonically with
//! coordinate distance, so every routine should find a strong negative
//! correlation. Used by tests, benches and the `demo` command.
//!
//! Layout for `n` entities:
//!   - ceil(2n/3) archetypes with uniform random coordinates; entity `i`
//!     binds to archetype `i mod n_archetypes`, so some archetypes are shared
//!   - entity `i` belongs to tradition `i mod 3`
//!   - count = round(50 · exp(−2·d))
//! ═══════════════════════════════════════════════════════════════════════════════

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::engine::{
    distance, ArchetypePoint, CooccurrenceEntry, CooccurrenceTable, CoordinateVector, Corpus,
    CorpusEntity, DistanceMetric, EntityArchetypeBinding, PairObservation, N_AXES,
};
use crate::snapshot::Snapshot;

pub const TRADITIONS: [&str; 3] = ["hellenic", "norse", "vedic"];

/// Peak count for coincident archetypes
const PEAK_COUNT: f64 = 50.0;
/// Decay rate of count with distance
const DECAY: f64 = 2.0;

/// Bindings plus the co-occurrence data that goes with them
#[derive(Debug, Clone)]
pub struct PlantedData {
    pub bindings: Vec<EntityArchetypeBinding>,
    pub entries: Vec<CooccurrenceEntry>,
    pub table: CooccurrenceTable,
}

fn archetype_count(n_entities: usize) -> usize {
    ((2 * n_entities + 2) / 3).max(1)
}

fn planted_count(d: f64) -> u64 {
    (PEAK_COUNT * (-DECAY * d).exp()).round() as u64
}

fn planted_archetypes(n_entities: usize, seed: u64) -> Vec<ArchetypePoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..archetype_count(n_entities))
        .map(|j| {
            let mut v = [0.0; N_AXES];
            for x in v.iter_mut() {
                *x = rng.gen::<f64>();
            }
            ArchetypePoint {
                id: format!("archetype_{:02}", j),
                coordinates: CoordinateVector::clamped(v),
            }
        })
        .collect()
}

fn entity_id(i: usize) -> String {
    format!("entity_{:02}", i)
}

/// Planted bindings and co-occurrence entries
pub fn planted_bindings(n_entities: usize, seed: u64) -> PlantedData {
    let archetypes = planted_archetypes(n_entities, seed);
    let n_arch = archetypes.len();

    let bindings: Vec<EntityArchetypeBinding> = (0..n_entities)
        .map(|i| {
            let a = &archetypes[i % n_arch];
            EntityArchetypeBinding::new(&entity_id(i), &a.id, a.coordinates)
                .with_tradition(TRADITIONS[i % TRADITIONS.len()])
        })
        .collect();

    let mut entries = Vec::new();
    for i in 0..n_entities {
        for j in (i + 1)..n_entities {
            let a = &archetypes[i % n_arch].coordinates;
            let b = &archetypes[j % n_arch].coordinates;
            let count = planted_count(distance(a, b, None, None, DistanceMetric::Euclidean));
            if count > 0 {
                entries.push(CooccurrenceEntry {
                    entity_a: entity_id(i),
                    entity_b: entity_id(j),
                    count,
                });
            }
        }
    }
    let table = CooccurrenceTable::from_entries(&entries);

    PlantedData {
        bindings,
        entries,
        table,
    }
}

/// Planted corpus assembled directly (no minimum-pair gate)
pub fn planted_corpus(n_entities: usize, seed: u64) -> Corpus {
    let archetypes = planted_archetypes(n_entities, seed);
    let n_arch = archetypes.len();

    let entities: Vec<CorpusEntity> = (0..n_entities)
        .map(|i| CorpusEntity {
            id: entity_id(i),
            archetype: i % n_arch,
            tradition: Some(TRADITIONS[i % TRADITIONS.len()].to_string()),
        })
        .collect();

    let mut pairs = Vec::new();
    for i in 0..n_entities {
        for j in (i + 1)..n_entities {
            let a = &archetypes[i % n_arch].coordinates;
            let b = &archetypes[j % n_arch].coordinates;
            let d = distance(a, b, None, None, DistanceMetric::Euclidean);
            pairs.push(PairObservation {
                entity_a: i,
                entity_b: j,
                distance: d,
                cooccurrence: planted_count(d),
            });
        }
    }

    Corpus::from_parts(archetypes, entities, pairs)
}

/// Planted data packaged as an input snapshot
pub fn planted_snapshot(n_entities: usize, seed: u64) -> Snapshot {
    let data = planted_bindings(n_entities, seed);
    Snapshot {
        bindings: data.bindings,
        cooccurrence: data.entries,
        segments: Vec::new(),
        exclude: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CorpusBuilder;

    #[test]
    fn test_builder_agrees_with_direct_corpus() {
        let data = planted_bindings(12, 4);
        let built = CorpusBuilder::new(&data.table)
            .build(&data.bindings)
            .into_success()
            .unwrap();
        let direct = planted_corpus(12, 4);
        assert_eq!(built.distances(), direct.distances());
        assert_eq!(built.cooccurrences(), direct.cooccurrences());
        assert_eq!(built.traditions(), direct.traditions());
    }

    #[test]
    fn test_layout() {
        let corpus = planted_corpus(20, 1);
        assert_eq!(corpus.len(), 190);
        assert_eq!(corpus.archetypes().len(), 14);
        assert_eq!(corpus.traditions().len(), 3);
        // shared archetypes sit at distance 0 with the peak count
        let shared = corpus.pairs().iter().find(|p| p.distance == 0.0).unwrap();
        assert_eq!(shared.cooccurrence, 50);
    }
}
