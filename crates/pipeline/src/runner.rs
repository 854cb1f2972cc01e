use anyhow::{Context, Result};
use extract::{
    Concept, ConceptRegistry, IngestReport, RawExtraction, Relation, concept_key, parse_concepts_with, parse_relations,
};
use graph::{ConceptGraph, GraphBuilder, GraphExport};
use ingest::{Chunk, Chunker, Document, Location};
use matching::{MatchKind, Matcher};
use ranking::{Priorities, PriorityReport, RelationPatterns, rank};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validate::{RelationValidator, ValidationStats};

use crate::cache::{ExtractionCache, MemoryCache};
use crate::config::PipelineConfig;
use crate::metrics::{MetricsSnapshot, PipelineMetrics, TimedOperation};

/// Source of raw concept-extraction output (JSON text) for one chunk.
pub trait ConceptExtractor {
    fn extract(&self, chunk: &Chunk) -> Result<String>;
}

impl<F> ConceptExtractor for F
where
    F: Fn(&Chunk) -> Result<String>,
{
    fn extract(&self, chunk: &Chunk) -> Result<String> {
        self(chunk)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub chunks: Vec<Chunk>,
    pub concepts: Vec<Concept>,
    pub ingest: IngestReport,
    pub relations: Vec<Relation>,
    pub validation: ValidationStats,
    #[serde(skip)]
    pub graph: ConceptGraph,
    pub export: GraphExport,
    pub central_concepts: Vec<(String, f64)>,
    #[serde(skip)]
    pub priorities: Priorities,
    pub report: PriorityReport,
    pub hierarchy: BTreeMap<String, usize>,
    pub patterns: RelationPatterns,
    pub metrics: MetricsSnapshot,
}

pub struct Pipeline {
    config: PipelineConfig,
    chunker: Chunker,
    matcher: Matcher,
    validator: RelationValidator,
    cache: Option<Arc<dyn ExtractionCache>>,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let chunker = Chunker::new(config.chunking).context("Failed to create chunker")?;

        let cache: Option<Arc<dyn ExtractionCache>> = if config.cache.enabled {
            Some(Arc::new(MemoryCache::new(config.cache.max_entries)))
        } else {
            None
        };

        Ok(Self {
            matcher: Matcher::new(config.matching),
            validator: RelationValidator::new(config.matching),
            chunker,
            cache,
            metrics: PipelineMetrics::new(),
            config,
        })
    }

    /// Replace the response cache, e.g. with one shared across pipelines.
    pub fn with_cache(mut self, cache: Arc<dyn ExtractionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Segment `document` and collect located extractions for every chunk.
    /// A failed or undecodable response skips its chunk. A mention already
    /// reported at the same paragraph by an earlier chunk is dropped, so
    /// overlap windows do not count twice.
    pub fn extract(&self, document: &Document, extractor: &dyn ConceptExtractor) -> (Vec<Chunk>, Vec<RawExtraction>) {
        let chunks = self.chunker.chunk_document(document);
        let mut extractions = Vec::new();
        let mut seen: HashSet<(Location, String)> = HashSet::new();

        for chunk in &chunks {
            let cached = self.cache.as_ref().and_then(|c| c.get(&chunk.content));
            let cache_hit = cached.is_some();
            self.metrics.record_chunk(cache_hit);

            let response = match cached {
                Some(response) => response,
                None => match extractor.extract(chunk) {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(chunk = %chunk.chunk_id, error = %e, "Extractor failed, skipping chunk");
                        self.metrics.record_failure();
                        continue;
                    }
                },
            };

            let fallback = Location::new(chunk.section_index, chunk.paragraph_indices.start);
            let parsed = match parse_concepts_with(&response, |raw| self.locate(chunk, raw).unwrap_or(fallback)) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(chunk = %chunk.chunk_id, error = %e, "Undecodable extractor response");
                    self.metrics.record_failure();
                    continue;
                }
            };

            if !cache_hit {
                if let Some(cache) = &self.cache {
                    cache.put(&chunk.content, response);
                }
            }

            self.metrics.record_parsed(parsed.records.len(), parsed.rejected.len());

            let (fresh, repeated): (Vec<RawExtraction>, Vec<RawExtraction>) = parsed
                .records
                .into_iter()
                .partition(|raw| !seen.contains(&(raw.location, concept_key(&raw.name))));
            seen.extend(fresh.iter().map(|raw| (raw.location, concept_key(&raw.name))));
            self.metrics.record_duplicates(repeated.len());

            debug!(
                chunk = %chunk.chunk_id,
                accepted = fresh.len(),
                duplicates = repeated.len(),
                rejected = parsed.rejected.len(),
                cache_hit,
                "Parsed chunk extractions"
            );

            extractions.extend(fresh);
        }

        (chunks, extractions)
    }

    /// Paragraph of `chunk` holding the extraction's evidence, or failing
    /// that its name. Exact matches in any paragraph win over fuzzy ones.
    fn locate(&self, chunk: &Chunk, raw: &RawExtraction) -> Option<Location> {
        for needle in [raw.evidence.as_str(), raw.name.as_str()] {
            if needle.trim().is_empty() {
                continue;
            }

            let hits: Vec<(usize, Option<MatchKind>)> = chunk
                .indexed_paragraphs()
                .map(|(idx, text)| (idx, self.matcher.find_concept(needle, text).kind))
                .collect();

            let best = hits
                .iter()
                .find(|(_, kind)| *kind == Some(MatchKind::Exact))
                .or_else(|| hits.iter().find(|(_, kind)| kind.is_some()));

            if let Some(&(paragraph, _)) = best {
                return Some(Location::new(chunk.section_index, paragraph));
            }
        }
        None
    }

    /// Full pass over one document. `relations` is the raw relation
    /// extractor output for the document.
    pub fn run(&self, document: &Document, extractor: &dyn ConceptExtractor, relations: &str) -> Result<PipelineOutput> {
        info!(title = %document.title, category = %document.category, "Running pipeline");

        let timer = TimedOperation::start();
        let (chunks, extractions) = self.extract(document, extractor);
        let mut registry = ConceptRegistry::new(self.config.matching);
        let ingest = registry.ingest_all(extractions);
        self.metrics.record_ingest(&ingest, timer.elapsed());

        let parsed = match parse_relations(relations) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Undecodable relation response, continuing without relations");
                Default::default()
            }
        };
        let decoded = parsed.records.len();
        let resolved: Vec<Relation> = parsed
            .records
            .into_iter()
            .filter_map(|relation| {
                let (source, target) = (relation.source.clone(), relation.target.clone());
                let resolved = registry.resolve_relation(relation);
                if resolved.is_none() {
                    warn!(%source, %target, "Relation endpoint is not a known concept, skipping");
                }
                resolved
            })
            .collect();
        let unresolved = decoded - resolved.len();
        let rejected_relations = parsed.rejected.len() + unresolved;

        let timer = TimedOperation::start();
        let relations = self.validator.validate_all(&resolved, &document.full_text());
        self.metrics.record_validation(relations.len(), timer.elapsed());
        let validation = ValidationStats::from_relations(&relations);

        let timer = TimedOperation::start();
        let mut builder = GraphBuilder::new(registry.concepts());
        if self.config.graph.cooccurrence {
            builder = builder.with_cooccurrence();
        }
        if self.config.graph.relations {
            builder = builder.with_relations(&relations);
        }
        let (graph, build) = builder.build();
        self.metrics
            .record_graph(build.relations_skipped + rejected_relations, timer.elapsed());

        let export = graph.export(self.config.graph.min_frequency, self.config.graph.min_edge_weight);
        let central_concepts = graph.central_concepts(self.config.graph.top_central);

        let priorities = rank(&relations);
        let hierarchy = priorities
            .hierarchy_levels(self.config.ranking.num_levels)
            .context("Failed to assign hierarchy levels")?;
        let report = priorities.report(document.title.clone(), document.category.clone());
        let patterns = RelationPatterns::analyze(&relations);

        let metrics = self.metrics.snapshot();
        info!(
            chunks = chunks.len(),
            concepts = registry.len(),
            relations = relations.len(),
            coverage = validation.coverage.percentage,
            "Pipeline finished"
        );

        Ok(PipelineOutput {
            chunks,
            concepts: registry.into_concepts(),
            ingest,
            relations,
            validation,
            graph,
            export,
            central_concepts,
            priorities,
            report,
            hierarchy,
            patterns,
            metrics,
        })
    }
}
