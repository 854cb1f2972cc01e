use extract::{Relation, concept_key};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shape of a relation list: type histogram, per-concept connection
/// counts and how relations spread over paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationPatterns {
    pub total_relationships: usize,
    pub relationship_types: BTreeMap<String, usize>,
    pub most_connected_concepts: BTreeMap<String, usize>,
    pub paragraph_distribution: BTreeMap<usize, usize>,
}

impl RelationPatterns {
    pub fn analyze(relations: &[Relation]) -> Self {
        let mut patterns = Self {
            total_relationships: relations.len(),
            ..Default::default()
        };

        for relation in relations {
            *patterns
                .relationship_types
                .entry(relation.relation_type.clone())
                .or_insert(0) += 1;

            for concept in [&relation.source, &relation.target] {
                *patterns
                    .most_connected_concepts
                    .entry(concept_key(concept))
                    .or_insert(0) += 1;
            }

            *patterns
                .paragraph_distribution
                .entry(relation.location.paragraph)
                .or_insert(0) += 1;
        }

        patterns
    }

    /// Highest connection counts first; ties by concept.
    pub fn top_connected(&self, n: usize) -> Vec<(&str, usize)> {
        let mut top: Vec<(&str, usize)> = self
            .most_connected_concepts
            .iter()
            .map(|(concept, &count)| (concept.as_str(), count))
            .collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        top.truncate(n);
        top
    }
}
