pub mod hierarchy;
pub mod patterns;
pub mod priority;

pub use hierarchy::hierarchy_levels;
pub use patterns::RelationPatterns;
pub use priority::{ConceptPriority, Priorities, PriorityReport, SortKey, rank};

#[derive(Debug, thiserror::Error)]
pub enum RankError {
    #[error("num_levels must be at least 1")]
    InvalidLevels,

    #[error("unknown sort key '{0}', expected one of: total, out, in")]
    UnknownSortKey(String),
}
