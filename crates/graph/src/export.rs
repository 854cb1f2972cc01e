use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::concept_graph::{ConceptEdge, ConceptGraph};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportNode {
    pub id: String,
    pub frequency: usize,
    pub variant_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportEdge {
    pub source: String,
    pub target: String,
    pub weight: usize,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relation_types: Vec<String>,
    pub directed: bool,
}

/// Flat node/edge lists for visualization or storage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
    #[serde(skip)]
    pub node_to_idx: HashMap<String, usize>,
}

impl GraphExport {
    fn add_node(&mut self, node: ExportNode) {
        self.node_to_idx.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_to_idx.contains_key(id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl ConceptGraph {
    /// Keep nodes with `frequency >= min_frequency` and edges with
    /// `weight >= min_edge_weight` whose endpoints both survive.
    pub fn export(&self, min_frequency: usize, min_edge_weight: usize) -> GraphExport {
        let mut export = GraphExport::default();

        for node in self.graph.node_weights() {
            if node.frequency >= min_frequency {
                export.add_node(ExportNode {
                    id: node.id.clone(),
                    frequency: node.frequency,
                    variant_names: node.variant_names.iter().cloned().collect(),
                });
            }
        }

        for edge in self.graph.edge_references() {
            let payload = edge.weight();
            if payload.weight() < min_edge_weight {
                continue;
            }
            let source = &self.graph[edge.source()].id;
            let target = &self.graph[edge.target()].id;
            if !export.contains(source) || !export.contains(target) {
                continue;
            }

            let (kind, relation_types, directed) = match payload {
                ConceptEdge::Cooccurrence { .. } => ("cooccurrence", Vec::new(), false),
                ConceptEdge::Relation { relation_types, .. } => ("relation", relation_types.clone(), true),
            };
            export.edges.push(ExportEdge {
                source: source.clone(),
                target: target.clone(),
                weight: payload.weight(),
                kind,
                relation_types,
                directed,
            });
        }

        info!(
            nodes = export.nodes.len(),
            edges = export.edges.len(),
            min_frequency,
            min_edge_weight,
            "Exported concept graph"
        );

        export
    }
}
