pub mod builder;
pub mod concept_graph;
pub mod export;

pub use builder::{BuildReport, GraphBuilder, build};
pub use concept_graph::{ConceptEdge, ConceptGraph, ConceptNode, GraphStats, RelatedConcept};
pub use export::{ExportEdge, ExportNode, GraphExport};
