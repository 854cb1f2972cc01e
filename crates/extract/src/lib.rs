pub mod canonicalizer;
pub mod parse;
pub mod schema;

pub use canonicalizer::{ConceptRegistry, IngestOutcome, IngestReport, concept_key};
pub use parse::{Parsed, clean_markdown_json, parse_concepts, parse_concepts_with, parse_relations};
pub use schema::{
    Appearance, Concept, ConceptRecord, ExtractionError, LocationRecord, RawExtraction, Relation,
    RelationRecord, ValidationResult,
};
