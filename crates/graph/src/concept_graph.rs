use extract::{Appearance, Concept};
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptNode {
    pub id: String,
    pub frequency: usize,
    pub variant_names: BTreeSet<String>,
    pub appearances: Vec<Appearance>,
}

impl From<&Concept> for ConceptNode {
    fn from(concept: &Concept) -> Self {
        Self {
            id: concept.id.clone(),
            frequency: concept.frequency(),
            variant_names: concept.variant_names.clone(),
            appearances: concept.appearances.clone(),
        }
    }
}

/// Edge payload. Co-occurrence edges are undirected and stored once, from
/// the earlier-registered concept to the later one; relation edges keep
/// their direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConceptEdge {
    Cooccurrence { weight: usize },
    Relation { weight: usize, relation_types: Vec<String> },
}

impl ConceptEdge {
    pub fn weight(&self) -> usize {
        match self {
            ConceptEdge::Cooccurrence { weight } | ConceptEdge::Relation { weight, .. } => *weight,
        }
    }

    pub fn is_cooccurrence(&self) -> bool {
        matches!(self, ConceptEdge::Cooccurrence { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedConcept {
    pub concept: String,
    /// Sum over every edge joining the two concepts, either direction
    pub weight: usize,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub cooccurrence_edges: usize,
    pub relation_edges: usize,
    pub most_frequent: Vec<(String, usize)>,
}

/// Concept graph over one node set with co-occurrence and relation edges.
/// Rebuilt from scratch whenever the registry or relation list changes.
#[derive(Debug, Clone, Default)]
pub struct ConceptGraph {
    pub(crate) graph: DiGraph<ConceptNode, ConceptEdge>,
    pub(crate) index: HashMap<String, NodeIndex>,
}

impl ConceptGraph {
    pub(crate) fn add_node(&mut self, node: ConceptNode) -> NodeIndex {
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    pub(crate) fn edge_between(&self, a: NodeIndex, b: NodeIndex, cooccurrence: bool) -> Option<EdgeIndex> {
        self.graph
            .edges_connecting(a, b)
            .find(|e| e.weight().is_cooccurrence() == cooccurrence)
            .map(|e| e.id())
    }

    pub fn inner(&self) -> &DiGraph<ConceptNode, ConceptEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, id: &str) -> Option<&ConceptNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &ConceptNode> {
        self.graph.node_weights()
    }

    pub fn cooccurrence_weight(&self, a: &str, b: &str) -> usize {
        let (Some(&x), Some(&y)) = (self.index.get(a), self.index.get(b)) else {
            return 0;
        };
        let (from, to) = if x < y { (x, y) } else { (y, x) };
        self.edge_between(from, to, true)
            .map_or(0, |e| self.graph[e].weight())
    }

    pub fn relation_edge(&self, source: &str, target: &str) -> Option<&ConceptEdge> {
        let (&s, &t) = (self.index.get(source)?, self.index.get(target)?);
        self.edge_between(s, t, false).map(|e| &self.graph[e])
    }

    /// Distinct neighbours over both edge kinds, ignoring direction.
    pub fn degree(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map_or(0, |&idx| self.neighbours(idx).len())
    }

    fn neighbours(&self, idx: NodeIndex) -> BTreeSet<NodeIndex> {
        self.graph
            .neighbors_undirected(idx)
            .filter(|&n| n != idx)
            .collect()
    }

    /// Degree centrality (`degree / (|V| - 1)`), highest first; ties by id.
    pub fn central_concepts(&self, top_n: usize) -> Vec<(String, f64)> {
        let n = self.graph.node_count();
        let mut ranked: Vec<(String, f64)> = self
            .graph
            .node_indices()
            .map(|idx| {
                let centrality = if n > 1 {
                    self.neighbours(idx).len() as f64 / (n - 1) as f64
                } else {
                    1.0
                };
                (self.graph[idx].id.clone(), centrality)
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(top_n);
        ranked
    }

    /// Neighbours by combined edge weight, then frequency, then id.
    pub fn related_concepts(&self, id: &str) -> Vec<RelatedConcept> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };

        let mut weights: HashMap<NodeIndex, usize> = HashMap::new();
        for direction in [Direction::Outgoing, Direction::Incoming] {
            for edge in self.graph.edges_directed(idx, direction) {
                let other = if edge.source() == idx { edge.target() } else { edge.source() };
                if other != idx {
                    *weights.entry(other).or_insert(0) += edge.weight().weight();
                }
            }
        }

        let mut related: Vec<RelatedConcept> = weights
            .into_iter()
            .map(|(n, weight)| RelatedConcept {
                concept: self.graph[n].id.clone(),
                weight,
                frequency: self.graph[n].frequency,
            })
            .collect();

        related.sort_by(|a, b| {
            b.weight
                .cmp(&a.weight)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.concept.cmp(&b.concept))
        });
        related
    }

    /// Most frequent concepts; equal frequencies keep registration order.
    pub fn top_by_frequency(&self, top_n: usize) -> Vec<&ConceptNode> {
        let mut nodes: Vec<&ConceptNode> = self.graph.node_weights().collect();
        nodes.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        nodes.truncate(top_n);
        nodes
    }

    pub fn stats(&self) -> GraphStats {
        let cooccurrence_edges = self
            .graph
            .edge_weights()
            .filter(|e| e.is_cooccurrence())
            .count();

        GraphStats {
            nodes: self.graph.node_count(),
            cooccurrence_edges,
            relation_edges: self.graph.edge_count() - cooccurrence_edges,
            most_frequent: self
                .top_by_frequency(10)
                .into_iter()
                .map(|n| (n.id.clone(), n.frequency))
                .collect(),
        }
    }
}
