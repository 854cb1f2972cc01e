use extract::{Concept, Relation, concept_key};
use ingest::Location;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::concept_graph::{ConceptEdge, ConceptGraph, ConceptNode};

/// Builds a [`ConceptGraph`] from a concept list (registration order) and,
/// optionally, validated relations.
pub struct GraphBuilder<'a> {
    concepts: &'a [Concept],
    cooccurrence: bool,
    relations: &'a [Relation],
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub cooccurrence_pairs: usize,
    pub relations_added: usize,
    /// No evidence, unknown endpoint, or self-relation
    pub relations_skipped: usize,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(concepts: &'a [Concept]) -> Self {
        Self {
            concepts,
            cooccurrence: false,
            relations: &[],
        }
    }

    pub fn with_cooccurrence(mut self) -> Self {
        self.cooccurrence = true;
        self
    }

    pub fn with_relations(mut self, relations: &'a [Relation]) -> Self {
        self.relations = relations;
        self
    }

    pub fn build(self) -> (ConceptGraph, BuildReport) {
        let mut graph = ConceptGraph::default();
        let mut report = BuildReport::default();

        let nodes: Vec<NodeIndex> = self
            .concepts
            .iter()
            .map(|c| graph.add_node(ConceptNode::from(c)))
            .collect();

        if self.cooccurrence {
            report.cooccurrence_pairs = self.add_cooccurrence(&mut graph, &nodes);
        }

        if !self.relations.is_empty() {
            let lookup = self.surface_lookup(&nodes);
            for relation in self.relations {
                if Self::add_relation(&mut graph, &lookup, relation) {
                    report.relations_added += 1;
                } else {
                    report.relations_skipped += 1;
                }
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            relations_added = report.relations_added,
            relations_skipped = report.relations_skipped,
            "Built concept graph"
        );

        (graph, report)
    }

    /// One increment per shared paragraph, paragraphs ascending, pairs in
    /// registration order.
    fn add_cooccurrence(&self, graph: &mut ConceptGraph, nodes: &[NodeIndex]) -> usize {
        let mut by_paragraph: BTreeMap<Location, Vec<NodeIndex>> = BTreeMap::new();
        for (concept, &idx) in self.concepts.iter().zip(nodes) {
            for location in concept.locations() {
                by_paragraph.entry(location).or_default().push(idx);
            }
        }

        let mut pairs = 0;
        for (location, members) in &by_paragraph {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    match graph.edge_between(a, b, true) {
                        Some(edge) => {
                            if let ConceptEdge::Cooccurrence { weight } = &mut graph.graph[edge] {
                                *weight += 1;
                            }
                        }
                        None => {
                            graph.graph.add_edge(a, b, ConceptEdge::Cooccurrence { weight: 1 });
                        }
                    }
                    pairs += 1;
                }
            }
            debug!(section = location.section, paragraph = location.paragraph, concepts = members.len(), "Paragraph co-occurrence");
        }

        pairs
    }

    /// Every id and variant key of every concept, pointing at its node.
    fn surface_lookup(&self, nodes: &[NodeIndex]) -> HashMap<String, NodeIndex> {
        let mut lookup = HashMap::new();
        for (concept, &idx) in self.concepts.iter().zip(nodes) {
            lookup.entry(concept_key(&concept.id)).or_insert(idx);
            for variant in &concept.variant_names {
                lookup.entry(concept_key(variant)).or_insert(idx);
            }
        }
        lookup
    }

    fn add_relation(graph: &mut ConceptGraph, lookup: &HashMap<String, NodeIndex>, relation: &Relation) -> bool {
        if !relation.has_evidence() {
            debug!(source = %relation.source, target = %relation.target, "Relation lacks supporting evidence");
            return false;
        }

        let source = lookup.get(&concept_key(&relation.source)).copied();
        let target = lookup.get(&concept_key(&relation.target)).copied();
        let (Some(source), Some(target)) = (source, target) else {
            warn!(source = %relation.source, target = %relation.target, "Relation endpoint is not a known concept");
            return false;
        };
        if source == target {
            debug!(concept = %relation.source, "Skipping self-relation");
            return false;
        }

        match graph.edge_between(source, target, false) {
            Some(edge) => {
                if let ConceptEdge::Relation { weight, relation_types } = &mut graph.graph[edge] {
                    *weight += 1;
                    if !relation_types.contains(&relation.relation_type) {
                        relation_types.push(relation.relation_type.clone());
                    }
                }
            }
            None => {
                graph.graph.add_edge(
                    source,
                    target,
                    ConceptEdge::Relation {
                        weight: 1,
                        relation_types: vec![relation.relation_type.clone()],
                    },
                );
            }
        }

        true
    }
}

/// Co-occurrence graph plus typed edges from `relations`.
pub fn build(concepts: &[Concept], relations: &[Relation]) -> ConceptGraph {
    GraphBuilder::new(concepts)
        .with_cooccurrence()
        .with_relations(relations)
        .build()
        .0
}
