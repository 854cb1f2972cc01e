//! Fuzzy matching of concept names and evidence against source text.

pub mod finder;
pub mod similarity;

pub use finder::{
    CONCEPT_SIMILARITY_THRESHOLD, EVIDENCE_SIMILARITY_THRESHOLD, MatchConfig, MatchKind, Matcher,
    TextMatch, find_in_text,
};
pub use similarity::{SimilarityMetric, gestalt_ratio, similarity};
