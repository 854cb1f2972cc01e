use anyhow::{Result, bail};
use extract::{ConceptRegistry, RawExtraction};
use ingest::{Chunk, Document, Location, Section};
use pipeline::{Pipeline, PipelineConfig, init_tracing};
use std::sync::atomic::{AtomicUsize, Ordering};

const P0: &str = "Tardigrades survive extreme cryptobiosis.";
const P1: &str = "Cryptobiosis allows tardigrades to withstand desiccation.";

fn document() -> Document {
    Document::new(
        "Tardigrade",
        "biology",
        vec![Section::new("Overview", vec![P0.to_string(), P1.to_string()])],
    )
}

fn concepts_response() -> String {
    serde_json::json!({
        "concepts": [
            {"name": "tardigrade", "variants": ["tardigrades"], "evidence": P0},
            {"name": "cryptobiosis", "evidence": P0},
            {"name": "tardigrade", "evidence": P1},
            {"name": "cryptobiosis", "evidence": P1},
            {"name": "   ", "evidence": P1}
        ]
    })
    .to_string()
}

fn relations_response() -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!([
            {
                "source_concept": "Tardigrade",
                "target_concept": "cryptobiosis",
                "relationship_type": "survives_by",
                "evidence": P0,
                "location": {"section": 0, "paragraph": 0}
            },
            {
                "source": "cryptobiosis",
                "target": "volcano",
                "relation_type": "near",
                "evidence": "Cryptobiosis happens near volcanoes.",
                "location": {"paragraph": 1}
            },
            {"source": "tardigrade", "evidence": P1}
        ])
    )
}

#[test]
fn test_registry_and_cooccurrence_scenario() {
    let mut registry = ConceptRegistry::default();
    for (paragraph, evidence) in [P0, P1].into_iter().enumerate() {
        for name in ["tardigrade", "cryptobiosis"] {
            registry
                .ingest(RawExtraction::new(name, evidence, Location::new(0, paragraph)))
                .unwrap();
        }
    }

    assert_eq!(registry.len(), 2);
    assert!(registry.iter().all(|c| c.frequency() == 2));

    let graph = graph::build(registry.concepts(), &[]);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.cooccurrence_weight("tardigrade", "cryptobiosis"), 2);
}

#[test]
fn test_full_pipeline() {
    init_tracing(false);

    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let response = concepts_response();
    let extractor = |_chunk: &Chunk| -> Result<String> { Ok(response.clone()) };

    let output = pipeline.run(&document(), &extractor, &relations_response()).unwrap();

    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.concepts.len(), 2);
    assert_eq!(output.ingest.inserted, 2);
    assert_eq!(output.ingest.merged, 2);
    assert_eq!(output.ingest.rejected, 0);

    let tardigrade = &output.concepts[0];
    assert_eq!(tardigrade.id, "tardigrade");
    assert_eq!(tardigrade.frequency(), 2);
    assert!(tardigrade.variant_names.contains("tardigrades"));
    let paragraphs: Vec<usize> = tardigrade.locations().iter().map(|l| l.paragraph).collect();
    assert_eq!(paragraphs, vec![0, 1]);

    assert_eq!(output.graph.cooccurrence_weight("tardigrade", "cryptobiosis"), 2);

    // the volcano relation names no known concept and is dropped
    assert_eq!(output.relations.len(), 1);
    let supported = &output.relations[0];
    assert_eq!(supported.source, "tardigrade");
    assert!(supported.has_evidence());
    assert_eq!(supported.validation.as_ref().unwrap().proximity_score, 1.0);
    assert_eq!(output.validation.coverage.percentage, 100.0);

    assert_eq!(
        output.graph.relation_edge("tardigrade", "cryptobiosis").map(|e| e.weight()),
        Some(1)
    );

    assert_eq!(output.report.title, "Tardigrade");
    assert_eq!(output.report.max_total_degree, 1);
    assert_eq!(output.hierarchy["cryptobiosis"], 0);
    assert_eq!(output.hierarchy["tardigrade"], 0);
    assert!(!output.hierarchy.contains_key("volcano"));
    assert_eq!(output.patterns.total_relationships, 1);

    assert_eq!(output.metrics.chunks_processed, 1);
    assert_eq!(output.metrics.extractions_rejected, 1);
    assert_eq!(output.metrics.relations_skipped, 2);
}

#[test]
fn test_relations_resolve_to_concept_ids() {
    const Q0: &str = "Tardigrades, also called water bears, enter cryptobiosis.";
    const Q1: &str = "Water bears survive cryptobiosis for decades.";
    let document = Document::new(
        "Tardigrade",
        "biology",
        vec![Section::new("Overview", vec![Q0.to_string(), Q1.to_string()])],
    );

    let response = serde_json::json!([
        {"name": "Tardigrade", "variants": ["water bear"], "evidence": Q0},
        {"name": "cryptobiosis", "evidence": Q0}
    ])
    .to_string();
    let extractor = |_chunk: &Chunk| -> Result<String> { Ok(response.clone()) };

    let relations = serde_json::json!([
        {"source": "Tardigrade", "target": "cryptobiosis", "relation_type": "enters",
         "evidence": Q0, "location": {"paragraph": 0}},
        {"source": "water bear", "target": "cryptobiosis", "relation_type": "survives_by",
         "evidence": Q1, "location": {"paragraph": 1}},
        {"source": "volcano", "target": "cryptobiosis", "relation_type": "causes",
         "evidence": "Volcanoes cause cryptobiosis.", "location": {"paragraph": 1}}
    ])
    .to_string();

    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let output = pipeline.run(&document, &extractor, &relations).unwrap();

    assert_eq!(output.relations.len(), 2);
    assert!(output.relations.iter().all(|r| r.source == "Tardigrade" && r.target == "cryptobiosis"));
    assert_eq!(
        output.graph.relation_edge("Tardigrade", "cryptobiosis").map(|e| e.weight()),
        Some(2)
    );

    // ranking sees the same endpoints as the graph
    assert_eq!(output.priorities.len(), 2);
    assert_eq!(output.priorities.get("Tardigrade").unwrap().out_degree, 2);
    assert!(output.priorities.get("water bear").is_none());
    assert_eq!(output.hierarchy.keys().collect::<Vec<_>>(), vec!["cryptobiosis", "tardigrade"]);
    assert_eq!(output.metrics.relations_skipped, 1);
}

#[test]
fn test_overlap_windows_do_not_double_count() {
    const R: [&str; 4] = [
        "Mosses cover the forest floor.",
        "Lichens grow on bare rock.",
        "Tardigrades live in both habitats.",
        "Rotifers share the same niche.",
    ];
    let document = Document::new(
        "Micro fauna",
        "biology",
        vec![Section::new("Habitat", R.iter().map(|p| p.to_string()).collect())],
    );

    let extractor = |chunk: &Chunk| -> Result<String> {
        let records = if chunk.paragraph_indices.start == 0 {
            serde_json::json!([
                {"name": "moss", "evidence": R[0]},
                {"name": "tardigrade", "evidence": R[2]}
            ])
        } else {
            serde_json::json!([
                {"name": "tardigrade", "evidence": R[2]},
                {"name": "rotifer", "evidence": R[3]}
            ])
        };
        Ok(records.to_string())
    };

    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let output = pipeline.run(&document, &extractor, "[]").unwrap();

    let windows: Vec<_> = output.chunks.iter().map(|c| c.paragraph_indices.clone()).collect();
    assert_eq!(windows, vec![0..3, 2..4]);

    assert_eq!(output.concepts.len(), 3);
    let tardigrade = output.concepts.iter().find(|c| c.id == "tardigrade").unwrap();
    assert_eq!(tardigrade.frequency(), 1);
    assert_eq!(tardigrade.appearances[0].location, Location::new(0, 2));
    assert_eq!(output.metrics.overlap_duplicates, 1);
    assert_eq!(output.ingest.inserted, 3);
}

#[test]
fn test_stated_location_is_kept() {
    let response = serde_json::json!([
        {"name": "tardigrade", "evidence": P1, "location": {"section": 0, "paragraph": 0}},
        {"name": "desiccation", "evidence": P1}
    ])
    .to_string();
    let extractor = |_chunk: &Chunk| -> Result<String> { Ok(response.clone()) };

    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let output = pipeline.run(&document(), &extractor, "[]").unwrap();

    assert_eq!(output.concepts[0].appearances[0].location, Location::new(0, 0));
    assert_eq!(output.concepts[1].appearances[0].location, Location::new(0, 1));
}

#[test]
fn test_cache_avoids_repeat_extraction() {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let calls = AtomicUsize::new(0);
    let response = concepts_response();
    let extractor = |_chunk: &Chunk| -> Result<String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(response.clone())
    };

    let first = pipeline.run(&document(), &extractor, "[]").unwrap();
    let second = pipeline.run(&document(), &extractor, "[]").unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.concepts, second.concepts);
    assert_eq!(second.metrics.cache_hits, 1);
    assert!(second.relations.is_empty());
    assert_eq!(second.report.max_total_degree, 0);
}

#[test]
fn test_extractor_failures_are_skipped() {
    let mut config = PipelineConfig::default();
    config.cache.enabled = false;
    let pipeline = Pipeline::new(config).unwrap();

    let failing = |_chunk: &Chunk| -> Result<String> { bail!("model unavailable") };
    let output = pipeline.run(&document(), &failing, "not json").unwrap();
    assert!(output.concepts.is_empty());
    assert!(output.relations.is_empty());
    assert_eq!(output.metrics.extraction_failures, 1);

    let garbage = |_chunk: &Chunk| -> Result<String> { Ok("I could not find any concepts.".to_string()) };
    let output = pipeline.run(&document(), &garbage, "[]").unwrap();
    assert!(output.concepts.is_empty());
    assert_eq!(output.metrics.extraction_failures, 2);
}

#[test]
fn test_invalid_config_is_fatal() {
    let mut config = PipelineConfig::default();
    config.chunking.overlap_size = 3;
    assert!(Pipeline::new(config).is_err());
}
