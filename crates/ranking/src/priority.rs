use extract::{Relation, concept_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::info;

use crate::RankError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptPriority {
    pub concept: String,
    pub out_degree: usize,
    pub in_degree: usize,
    pub total_degree: usize,
    /// `total_degree / max_total_degree`, 0 when there are no relations
    pub normalized_score: f64,
}

impl ConceptPriority {
    fn new(concept: String) -> Self {
        Self {
            concept,
            out_degree: 0,
            in_degree: 0,
            total_degree: 0,
            normalized_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Total,
    Out,
    In,
}

impl SortKey {
    fn degree(self, priority: &ConceptPriority) -> usize {
        match self {
            SortKey::Total => priority.total_degree,
            SortKey::Out => priority.out_degree,
            SortKey::In => priority.in_degree,
        }
    }
}

impl FromStr for SortKey {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "total" => Ok(SortKey::Total),
            "out" => Ok(SortKey::Out),
            "in" => Ok(SortKey::In),
            _ => Err(RankError::UnknownSortKey(s.to_string())),
        }
    }
}

/// Degree snapshot of one relation list, keyed by concept key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Priorities {
    pub max_total_degree: usize,
    pub concepts: BTreeMap<String, ConceptPriority>,
}

impl Priorities {
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn get(&self, concept: &str) -> Option<&ConceptPriority> {
        self.concepts.get(&concept_key(concept))
    }

    /// Descending by the chosen degree; ties by concept ascending.
    pub fn sorted_priorities(&self, by: SortKey) -> Vec<&ConceptPriority> {
        let mut sorted: Vec<&ConceptPriority> = self.concepts.values().collect();
        sorted.sort_by(|a, b| {
            by.degree(b)
                .cmp(&by.degree(a))
                .then_with(|| a.concept.cmp(&b.concept))
        });
        sorted
    }

    pub fn report(&self, title: impl Into<String>, category: impl Into<String>) -> PriorityReport {
        PriorityReport {
            title: title.into(),
            category: category.into(),
            max_total_degree: self.max_total_degree,
            concepts: self.concepts.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityReport {
    pub title: String,
    pub category: String,
    pub max_total_degree: usize,
    pub concepts: BTreeMap<String, ConceptPriority>,
}

/// Count each concept's appearances as source (out) and target (in).
pub fn rank(relations: &[Relation]) -> Priorities {
    let mut concepts: BTreeMap<String, ConceptPriority> = BTreeMap::new();

    for relation in relations {
        let source = concept_key(&relation.source);
        concepts
            .entry(source.clone())
            .or_insert_with(|| ConceptPriority::new(source))
            .out_degree += 1;

        let target = concept_key(&relation.target);
        concepts
            .entry(target.clone())
            .or_insert_with(|| ConceptPriority::new(target))
            .in_degree += 1;
    }

    let mut max_total_degree = 0;
    for priority in concepts.values_mut() {
        priority.total_degree = priority.out_degree + priority.in_degree;
        max_total_degree = max_total_degree.max(priority.total_degree);
    }

    if max_total_degree > 0 {
        for priority in concepts.values_mut() {
            priority.normalized_score = priority.total_degree as f64 / max_total_degree as f64;
        }
    }

    info!(
        relations = relations.len(),
        concepts = concepts.len(),
        max_total_degree,
        "Ranked concepts"
    );

    Priorities {
        max_total_degree,
        concepts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::Location;

    fn rel(source: &str, target: &str) -> Relation {
        Relation::new(source, target, "related_to", "", Location::default())
    }

    #[test]
    fn test_degrees_and_normalization() {
        let priorities = rank(&[
            rel("Tardigrade", "cryptobiosis"),
            rel("tardigrade", "desiccation"),
            rel("cryptobiosis", "desiccation"),
            rel("moss", "tardigrade"),
        ]);

        let tardigrade = priorities.get("TARDIGRADE").unwrap();
        assert_eq!(tardigrade.out_degree, 2);
        assert_eq!(tardigrade.in_degree, 1);
        assert_eq!(tardigrade.total_degree, 3);
        assert_eq!(tardigrade.normalized_score, 1.0);

        let moss = priorities.get("moss").unwrap();
        assert_eq!(moss.total_degree, 1);
        assert!((moss.normalized_score - 1.0 / 3.0).abs() < 1e-12);

        assert_eq!(priorities.max_total_degree, 3);
        assert_eq!(priorities.len(), 4);
    }

    #[test]
    fn test_no_relations() {
        let priorities = rank(&[]);
        assert!(priorities.is_empty());
        assert_eq!(priorities.max_total_degree, 0);
    }

    #[test]
    fn test_self_relation_counts_both_ways() {
        let priorities = rank(&[rel("moss", "Moss")]);
        let moss = priorities.get("moss").unwrap();
        assert_eq!((moss.out_degree, moss.in_degree, moss.total_degree), (1, 1, 2));
    }

    #[test]
    fn test_sorted_priorities() {
        let priorities = rank(&[
            rel("a", "b"),
            rel("c", "b"),
            rel("b", "d"),
            rel("a", "d"),
        ]);

        let total: Vec<&str> = priorities.sorted_priorities(SortKey::Total).iter().map(|p| p.concept.as_str()).collect();
        assert_eq!(total, vec!["b", "a", "d", "c"]);

        let out: Vec<&str> = priorities.sorted_priorities(SortKey::Out).iter().map(|p| p.concept.as_str()).collect();
        assert_eq!(out, vec!["a", "b", "c", "d"]);

        let incoming: Vec<&str> = priorities.sorted_priorities(SortKey::In).iter().map(|p| p.concept.as_str()).collect();
        assert_eq!(incoming, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("Total".parse::<SortKey>().unwrap(), SortKey::Total);
        assert_eq!("in".parse::<SortKey>().unwrap(), SortKey::In);
        assert!(matches!("degree".parse::<SortKey>(), Err(RankError::UnknownSortKey(_))));
    }

    #[test]
    fn test_report_shape() {
        let report = rank(&[rel("tardigrade", "moss")]).report("Tardigrade", "biology");
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["title"], "Tardigrade");
        assert_eq!(json["max_total_degree"], 1);
        assert_eq!(json["concepts"]["moss"]["in_degree"], 1);
        assert_eq!(json["concepts"]["tardigrade"]["normalized_score"], 1.0);
    }
}
