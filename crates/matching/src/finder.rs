use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::similarity::SimilarityMetric;

pub const CONCEPT_SIMILARITY_THRESHOLD: f64 = 0.8;
pub const EVIDENCE_SIMILARITY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Concept name vs. concept name or word window
    pub concept_threshold: f64,
    /// Evidence snippet vs. document sentence
    pub evidence_threshold: f64,
    #[serde(default)]
    pub metric: SimilarityMetric,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            concept_threshold: CONCEPT_SIMILARITY_THRESHOLD,
            evidence_threshold: EVIDENCE_SIMILARITY_THRESHOLD,
            metric: SimilarityMetric::Gestalt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatch {
    pub found: bool,
    pub matched_span: String,
    pub kind: Option<MatchKind>,
}

impl TextMatch {
    fn exact(span: String) -> Self {
        Self {
            found: true,
            matched_span: span,
            kind: Some(MatchKind::Exact),
        }
    }

    fn fuzzy(span: String) -> Self {
        Self {
            found: true,
            matched_span: span,
            kind: Some(MatchKind::Fuzzy),
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            matched_span: String::new(),
            kind: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        self.config.metric.score(a, b)
    }

    /// Locate a concept name in text using the concept threshold.
    pub fn find_concept(&self, needle: &str, haystack: &str) -> TextMatch {
        self.find_with_threshold(needle, haystack, self.config.concept_threshold)
    }

    /// Case-insensitive substring check first; otherwise slide a window of
    /// the needle's word count over the haystack and take the first window
    /// scoring strictly above `threshold`.
    pub fn find_with_threshold(&self, needle: &str, haystack: &str, threshold: f64) -> TextMatch {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return TextMatch::not_found();
        }
        let haystack = haystack.to_lowercase();

        if haystack.contains(&needle) {
            return TextMatch::exact(needle);
        }

        let words: Vec<&str> = haystack.split_whitespace().collect();
        let window_size = needle.split_whitespace().count();
        if words.len() < window_size {
            return TextMatch::not_found();
        }

        for window in words.windows(window_size) {
            let candidate = window.join(" ");
            let score = self.similarity(&needle, &candidate);
            if score > threshold {
                trace!(needle = %needle, window = %candidate, score, "Fuzzy window match");
                return TextMatch::fuzzy(candidate);
            }
        }

        TextMatch::not_found()
    }

    /// Evidence counts as present in a sentence when contained in it or
    /// similar above the evidence threshold. Both inputs should already be
    /// cleaned the same way.
    pub fn evidence_matches(&self, evidence: &str, sentence: &str) -> bool {
        if evidence.is_empty() {
            return false;
        }
        sentence.contains(evidence) || self.similarity(evidence, sentence) > self.config.evidence_threshold
    }
}

/// `find_in_text` with the default concept threshold.
pub fn find_in_text(needle: &str, haystack: &str) -> TextMatch {
    Matcher::default().find_concept(needle, haystack)
}
