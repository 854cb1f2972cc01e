use extract::{Relation, ValidationResult};
use matching::{MatchConfig, Matcher, TextMatch};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::text::{clean_text, split_sentences};

/// Document text cleaned and split once, shared by every relation checked
/// against it.
#[derive(Debug, Clone)]
pub struct PreparedText {
    pub text: String,
    pub sentences: Vec<String>,
}

impl PreparedText {
    pub fn new(document_text: &str) -> Self {
        let text = clean_text(document_text);
        let sentences = split_sentences(&text);
        Self { text, sentences }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelationValidator {
    matcher: Matcher,
}

impl RelationValidator {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            matcher: Matcher::new(config),
        }
    }

    pub fn validate(&self, relation: &Relation, document_text: &str) -> ValidationResult {
        self.validate_prepared(relation, &PreparedText::new(document_text))
    }

    pub fn validate_prepared(&self, relation: &Relation, document: &PreparedText) -> ValidationResult {
        let evidence = clean_text(&relation.evidence);

        let evidence_present = document
            .sentences
            .iter()
            .any(|sentence| self.matcher.evidence_matches(&evidence, sentence));

        let source_local = self.matcher.find_concept(&relation.source, &evidence);
        let target_local = self.matcher.find_concept(&relation.target, &evidence);

        if source_local.found && target_local.found {
            let proximity_score = if document.is_empty() { 0.0 } else { 1.0 };
            return ValidationResult {
                source_present: true,
                target_present: true,
                evidence_present,
                proximity_score,
                source_match: source_local.matched_span,
                target_match: target_local.matched_span,
            };
        }

        let source = self.widen(&relation.source, source_local, document);
        let target = self.widen(&relation.target, target_local, document);
        let proximity_score = if source.found && target.found && !document.is_empty() {
            0.5
        } else {
            0.0
        };

        debug!(
            source = %relation.source,
            target = %relation.target,
            source_present = source.found,
            target_present = target.found,
            proximity_score,
            "Relation endpoints not both in evidence"
        );

        ValidationResult {
            source_present: source.found,
            target_present: target.found,
            evidence_present,
            proximity_score,
            source_match: source.matched_span,
            target_match: target.matched_span,
        }
    }

    /// Fall back to the whole document when the evidence did not contain the concept.
    fn widen(&self, concept: &str, local: TextMatch, document: &PreparedText) -> TextMatch {
        if local.found {
            return local;
        }
        self.matcher.find_concept(concept, &document.text)
    }

    /// Validate a batch in parallel. Output order follows input order.
    pub fn validate_all(&self, relations: &[Relation], document_text: &str) -> Vec<Relation> {
        let document = PreparedText::new(document_text);

        let validated: Vec<Relation> = relations
            .par_iter()
            .map(|relation| relation.validated(self.validate_prepared(relation, &document)))
            .collect();

        let supported = validated.iter().filter(|r| r.has_evidence()).count();
        info!(
            relations = validated.len(),
            evidence_present = supported,
            sentences = document.sentences.len(),
            "Validated relations"
        );

        validated
    }
}
