use matching::{MatchConfig, Matcher};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::schema::{Appearance, Concept, ExtractionError, RawExtraction, Relation};

/// Comparison key: case-folded and trimmed.
pub fn concept_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Some key equalled an existing id or variant.
    MergedExact { id: String },
    /// Name was similar enough to an existing id.
    MergedFuzzy { id: String, score: f64 },
    Inserted { id: String },
}

impl IngestOutcome {
    pub fn id(&self) -> &str {
        match self {
            IngestOutcome::MergedExact { id }
            | IngestOutcome::MergedFuzzy { id, .. }
            | IngestOutcome::Inserted { id } => id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub merged: usize,
    pub inserted: usize,
    pub rejected: usize,
}

/// Canonical concept registry.
///
/// Concepts are kept in creation order and are never removed. Every variant
/// key is owned by exactly one concept; a variant already owned elsewhere is
/// not added to the concept being merged into.
#[derive(Debug, Clone, Default)]
pub struct ConceptRegistry {
    concepts: Vec<Concept>,
    /// concept_key(variant) -> index into `concepts`
    keys: HashMap<String, usize>,
    matcher: Matcher,
}

impl ConceptRegistry {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            concepts: Vec::new(),
            keys: HashMap::new(),
            matcher: Matcher::new(config),
        }
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Concepts in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.iter()
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn into_concepts(self) -> Vec<Concept> {
        self.concepts
    }

    /// Creation index of the concept owning this surface form.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.keys.get(&concept_key(name)).copied()
    }

    /// Look up a concept by id or any of its variants, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<&Concept> {
        self.position(name).map(|idx| &self.concepts[idx])
    }

    pub fn get(&self, id: &str) -> Option<&Concept> {
        self.resolve(id).filter(|c| c.id == id)
    }

    /// Rewrite both endpoints to canonical concept ids. `None` when either
    /// endpoint is not a known id or variant.
    pub fn resolve_relation(&self, relation: Relation) -> Option<Relation> {
        let source = self.resolve(&relation.source)?.id.clone();
        let target = self.resolve(&relation.target)?.id.clone();
        Some(Relation {
            source,
            target,
            ..relation
        })
    }

    /// Concepts by frequency descending, then creation order.
    pub fn most_frequent(&self, n: usize) -> Vec<&Concept> {
        let mut ranked: Vec<&Concept> = self.concepts.iter().collect();
        ranked.sort_by(|a, b| b.frequency().cmp(&a.frequency()));
        ranked.truncate(n);
        ranked
    }

    pub fn ingest(&mut self, raw: RawExtraction) -> Result<IngestOutcome, ExtractionError> {
        let name_key = concept_key(&raw.name);
        if name_key.is_empty() {
            return Err(ExtractionError::MalformedInput {
                record: "extraction",
                field: "name",
            });
        }

        if let Some(idx) = self.exact_match(&name_key, &raw.variant_names) {
            self.merge_into(idx, raw);
            let id = self.concepts[idx].id.clone();
            debug!(concept = %id, "Merged extraction by exact key");
            return Ok(IngestOutcome::MergedExact { id });
        }

        if let Some((idx, score)) = self.fuzzy_match(&name_key) {
            debug!(concept = %self.concepts[idx].id, name = %raw.name, score, "Merged extraction by similarity");
            self.merge_into(idx, raw);
            return Ok(IngestOutcome::MergedFuzzy {
                id: self.concepts[idx].id.clone(),
                score,
            });
        }

        let id = self.insert(raw);
        debug!(concept = %id, "Inserted concept");
        Ok(IngestOutcome::Inserted { id })
    }

    /// Ingest a batch; rejected records are logged and skipped.
    pub fn ingest_all<I>(&mut self, extractions: I) -> IngestReport
    where
        I: IntoIterator<Item = RawExtraction>,
    {
        let mut report = IngestReport::default();

        for raw in extractions {
            match self.ingest(raw) {
                Ok(IngestOutcome::Inserted { .. }) => report.inserted += 1,
                Ok(_) => report.merged += 1,
                Err(e) => {
                    warn!(error = %e, "Skipping extraction");
                    report.rejected += 1;
                }
            }
        }

        report
    }

    /// Consuming form of [`ingest`](Self::ingest) for threading the
    /// registry through a fold; rejected records leave it unchanged.
    pub fn with(mut self, raw: RawExtraction) -> Self {
        if let Err(e) = self.ingest(raw) {
            warn!(error = %e, "Skipping extraction");
        }
        self
    }

    /// Replay another registry into this one, concept by concept in
    /// creation order, appearance by appearance.
    pub fn merge(&mut self, other: ConceptRegistry) -> IngestReport {
        let replay = other.concepts.into_iter().flat_map(|concept| {
            let mut variants = Some(concept.variant_names);
            let id = concept.id;
            concept.appearances.into_iter().map(move |appearance| {
                let mut raw = RawExtraction::new(id.clone(), appearance.evidence, appearance.location);
                if let Some(v) = variants.take() {
                    raw.variant_names = v;
                }
                raw
            })
        });

        self.ingest_all(replay.collect::<Vec<_>>())
    }

    /// The name key wins; otherwise the earliest-created concept among
    /// variant matches.
    fn exact_match(&self, name_key: &str, variants: &BTreeSet<String>) -> Option<usize> {
        if let Some(&idx) = self.keys.get(name_key) {
            return Some(idx);
        }
        variants
            .iter()
            .filter_map(|v| self.keys.get(&concept_key(v)).copied())
            .min()
    }

    /// Highest similarity at or above the threshold; ties keep the
    /// earliest-created concept.
    fn fuzzy_match(&self, name_key: &str) -> Option<(usize, f64)> {
        let threshold = self.matcher.config().concept_threshold;
        let mut best: Option<(usize, f64)> = None;

        for (idx, concept) in self.concepts.iter().enumerate() {
            let score = self.matcher.similarity(name_key, &concept_key(&concept.id));
            if score < threshold {
                continue;
            }
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((idx, score));
            }
        }

        best
    }

    fn merge_into(&mut self, idx: usize, raw: RawExtraction) {
        let RawExtraction {
            name,
            variant_names,
            evidence,
            location,
        } = raw;

        self.concepts[idx].appearances.push(Appearance { location, evidence });

        for surface in std::iter::once(name).chain(variant_names) {
            self.claim(idx, surface);
        }
    }

    fn insert(&mut self, raw: RawExtraction) -> String {
        let idx = self.concepts.len();
        let id = raw.name.trim().to_string();

        self.concepts.push(Concept {
            id: id.clone(),
            variant_names: BTreeSet::new(),
            appearances: vec![Appearance {
                location: raw.location,
                evidence: raw.evidence,
            }],
        });

        self.claim(idx, id.clone());
        for variant in raw.variant_names {
            self.claim(idx, variant);
        }

        id
    }

    fn claim(&mut self, idx: usize, surface: String) {
        let surface = surface.trim().to_string();
        let key = concept_key(&surface);
        if key.is_empty() {
            return;
        }

        match self.keys.get(&key) {
            Some(&owner) if owner != idx => {
                debug!(
                    variant = %surface,
                    owner = %self.concepts[owner].id,
                    concept = %self.concepts[idx].id,
                    "Variant already owned by another concept"
                );
            }
            _ => {
                self.keys.insert(key, idx);
                self.concepts[idx].variant_names.insert(surface);
            }
        }
    }
}
