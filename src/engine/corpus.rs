//! Analysis corpus: archetype points, entities, and every unordered entity pair
//! with its (distance, co-occurrence) observation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use super::cooccurrence::{CooccurrenceCache, CooccurrenceProvider};
use super::coordinates::{Axis, AxisWeights, CoordinateVector, EntityArchetypeBinding};
use super::distance::{distance, DistanceMetric};
use crate::outcome::{Analysis, MIN_PAIRS};
use crate::stats::FixedSeries;

/// An archetype's position in coordinate space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypePoint {
    pub id: String,
    pub coordinates: CoordinateVector,
}

/// An entity admitted to the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntity {
    pub id: String,
    /// Index into [`Corpus::archetypes`]
    pub archetype: usize,
    pub tradition: Option<String>,
}

/// One (distance, co-occurrence) sample for an unordered entity pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairObservation {
    /// Index into [`Corpus::entities`], always `< entity_b`
    pub entity_a: usize,
    pub entity_b: usize,
    pub distance: f64,
    pub cooccurrence: u64,
}

/// Bookkeeping from corpus construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub n_entities: usize,
    pub n_archetypes: usize,
    pub n_pairs: usize,
    pub n_excluded: usize,
    pub n_missing_coordinates: usize,
    pub n_duplicate_bindings: usize,
    pub n_nonzero_pairs: usize,
    pub traditions: Vec<String>,
}

/// The immutable snapshot every analysis reads
#[derive(Debug, Clone)]
pub struct Corpus {
    archetypes: Vec<ArchetypePoint>,
    entities: Vec<CorpusEntity>,
    pairs: Vec<PairObservation>,
    summary: CorpusSummary,
    metric: DistanceMetric,
}

impl Corpus {
    /// Assemble a corpus from parts; distances are taken as given
    pub fn from_parts(
        archetypes: Vec<ArchetypePoint>,
        entities: Vec<CorpusEntity>,
        pairs: Vec<PairObservation>,
    ) -> Self {
        let traditions: BTreeSet<String> =
            entities.iter().filter_map(|e| e.tradition.clone()).collect();
        let summary = CorpusSummary {
            n_entities: entities.len(),
            n_archetypes: archetypes.len(),
            n_pairs: pairs.len(),
            n_nonzero_pairs: pairs.iter().filter(|p| p.cooccurrence > 0).count(),
            traditions: traditions.into_iter().collect(),
            ..CorpusSummary::default()
        };
        Self {
            archetypes,
            entities,
            pairs,
            summary,
            metric: DistanceMetric::Euclidean,
        }
    }

    /// Record the metric the pair distances were computed with
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn archetypes(&self) -> &[ArchetypePoint] {
        &self.archetypes
    }

    pub fn entities(&self) -> &[CorpusEntity] {
        &self.entities
    }

    pub fn pairs(&self) -> &[PairObservation] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn summary(&self) -> &CorpusSummary {
        &self.summary
    }

    pub fn traditions(&self) -> &[String] {
        &self.summary.traditions
    }

    /// Archetype coordinates in archetype order
    pub fn archetype_coordinates(&self) -> Vec<CoordinateVector> {
        self.archetypes.iter().map(|a| a.coordinates).collect()
    }

    /// Coordinates of every entity (through its archetype), in entity order
    pub fn entity_coordinates(&self) -> Vec<CoordinateVector> {
        self.entities
            .iter()
            .map(|e| self.archetypes[e.archetype].coordinates)
            .collect()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.distance).collect()
    }

    pub fn cooccurrences(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.cooccurrence as f64).collect()
    }

    /// Co-occurrence column with ranks precomputed
    pub fn cooccurrence_series(&self) -> FixedSeries {
        FixedSeries::new(self.cooccurrences())
    }

    /// Pair distances under alternative archetype coordinates
    pub fn distances_for_archetypes(
        &self,
        coordinates: &[CoordinateVector],
        weights: Option<&AxisWeights>,
        axes: Option<&[Axis]>,
        metric: DistanceMetric,
    ) -> Vec<f64> {
        self.pairs
            .iter()
            .map(|p| {
                let a = &coordinates[self.entities[p.entity_a].archetype];
                let b = &coordinates[self.entities[p.entity_b].archetype];
                distance(a, b, weights, axes, metric)
            })
            .collect()
    }

    /// Pair distances when entity `i` takes coordinate vector `entity_coords[i]`
    pub fn distances_for_entities(&self, entity_coords: &[CoordinateVector]) -> Vec<f64> {
        self.pairs
            .iter()
            .map(|p| {
                distance(
                    &entity_coords[p.entity_a],
                    &entity_coords[p.entity_b],
                    None,
                    None,
                    self.metric,
                )
            })
            .collect()
    }

    fn in_tradition(&self, entity: usize, label: &str) -> bool {
        self.entities[entity].tradition.as_deref() == Some(label)
    }

    /// Pairs whose endpoints both belong to `label`
    pub fn pairs_within_tradition(&self, label: &str) -> Vec<usize> {
        self.pairs
            .iter()
            .enumerate()
            .filter(|(_, p)| self.in_tradition(p.entity_a, label) && self.in_tradition(p.entity_b, label))
            .map(|(i, _)| i)
            .collect()
    }

    /// Pairs with no endpoint in `label`
    pub fn pairs_outside_tradition(&self, label: &str) -> Vec<usize> {
        self.pairs
            .iter()
            .enumerate()
            .filter(|(_, p)| !self.in_tradition(p.entity_a, label) && !self.in_tradition(p.entity_b, label))
            .map(|(i, _)| i)
            .collect()
    }

    /// Same entities and pairs, distances recomputed under new archetype
    /// coordinates (one per archetype, in archetype order)
    pub fn with_archetype_coordinates(&self, coordinates: &[CoordinateVector]) -> Corpus {
        let archetypes: Vec<ArchetypePoint> = self
            .archetypes
            .iter()
            .zip(coordinates)
            .map(|(a, c)| ArchetypePoint {
                id: a.id.clone(),
                coordinates: *c,
            })
            .collect();
        let distances = self.distances_for_archetypes(coordinates, None, None, self.metric);
        let pairs = self
            .pairs
            .iter()
            .zip(distances)
            .map(|(p, distance)| PairObservation { distance, ..*p })
            .collect();
        let mut corpus = Corpus::from_parts(archetypes, self.entities.clone(), pairs)
            .with_metric(self.metric);
        corpus.summary.n_excluded = self.summary.n_excluded;
        corpus.summary.n_missing_coordinates = self.summary.n_missing_coordinates;
        corpus.summary.n_duplicate_bindings = self.summary.n_duplicate_bindings;
        corpus
    }

    /// Same entities and archetypes, restricted to the given pairs
    pub fn with_pairs(&self, pair_indices: &[usize]) -> Corpus {
        let pairs = pair_indices.iter().map(|&i| self.pairs[i]).collect();
        let mut corpus = Corpus::from_parts(self.archetypes.clone(), self.entities.clone(), pairs)
            .with_metric(self.metric);
        corpus.summary.n_excluded = self.summary.n_excluded;
        corpus.summary.n_missing_coordinates = self.summary.n_missing_coordinates;
        corpus.summary.n_duplicate_bindings = self.summary.n_duplicate_bindings;
        corpus
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CORPUS BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds corpora from bindings, owning the co-occurrence memo
pub struct CorpusBuilder<'a, P: CooccurrenceProvider + ?Sized> {
    provider: &'a P,
    cache: CooccurrenceCache,
    exclusions: HashSet<String>,
    metric: DistanceMetric,
}

impl<'a, P: CooccurrenceProvider + ?Sized> CorpusBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            cache: CooccurrenceCache::new(),
            exclusions: HashSet::new(),
            metric: DistanceMetric::Euclidean,
        }
    }

    /// Entity ids to drop (known false-positive name matches)
    pub fn exclude<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn cache(&self) -> &CooccurrenceCache {
        &self.cache
    }

    /// Forget memoized counts (data source changed)
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    pub fn build(&mut self, bindings: &[EntityArchetypeBinding]) -> Analysis<Corpus> {
        let mut archetypes: Vec<ArchetypePoint> = Vec::new();
        let mut archetype_index: HashMap<String, usize> = HashMap::new();
        let mut entities: Vec<CorpusEntity> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        let (mut n_excluded, mut n_missing, mut n_duplicate) = (0, 0, 0);

        for binding in bindings {
            if self.exclusions.contains(&binding.entity_id) {
                n_excluded += 1;
                continue;
            }
            let Some(coordinates) = binding.coordinates else {
                n_missing += 1;
                continue;
            };
            if !seen.insert(binding.entity_id.as_str()) {
                n_duplicate += 1;
                continue;
            }

            let archetype = *archetype_index
                .entry(binding.archetype_id.clone())
                .or_insert_with(|| {
                    archetypes.push(ArchetypePoint {
                        id: binding.archetype_id.clone(),
                        coordinates,
                    });
                    archetypes.len() - 1
                });

            entities.push(CorpusEntity {
                id: binding.entity_id.clone(),
                archetype,
                tradition: binding.tradition.clone(),
            });
        }

        let n = entities.len();
        let mut pairs = Vec::with_capacity(n.saturating_sub(1) * n / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                let a = &archetypes[entities[i].archetype].coordinates;
                let b = &archetypes[entities[j].archetype].coordinates;
                let cooccurrence = self
                    .cache
                    .lookup(self.provider, &entities[i].id, &entities[j].id);
                pairs.push(PairObservation {
                    entity_a: i,
                    entity_b: j,
                    distance: distance(a, b, None, None, self.metric),
                    cooccurrence,
                });
            }
        }

        debug!(
            entities = n,
            excluded = n_excluded,
            missing = n_missing,
            duplicates = n_duplicate,
            "corpus filtering complete"
        );

        if pairs.len() < MIN_PAIRS {
            return Analysis::insufficient_pairs(pairs.len());
        }

        let mut corpus = Corpus::from_parts(archetypes, entities, pairs).with_metric(self.metric);
        corpus.summary.n_excluded = n_excluded;
        corpus.summary.n_missing_coordinates = n_missing;
        corpus.summary.n_duplicate_bindings = n_duplicate;

        info!(
            entities = corpus.summary.n_entities,
            archetypes = corpus.summary.n_archetypes,
            pairs = corpus.summary.n_pairs,
            "corpus built"
        );
        Analysis::Success(corpus)
    }
}

/// Build the analysis corpus from bindings, a co-occurrence provider, and an
/// exclusion set
pub fn build_corpus<P: CooccurrenceProvider + ?Sized>(
    bindings: &[EntityArchetypeBinding],
    cooccurrence: &P,
    exclude: &HashSet<String>,
) -> Analysis<Corpus> {
    CorpusBuilder::new(cooccurrence)
        .exclude(exclude.iter().cloned())
        .build(bindings)
}
