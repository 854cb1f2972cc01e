//! End-to-end orchestration: segment, extract through a cache, canonicalize,
//! validate, build the concept graph and rank.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod runner;
pub mod telemetry;

pub use cache::{CacheStats, ExtractionCache, MemoryCache};
pub use config::{CacheConfig, GraphConfig, OperationMode, PipelineConfig, RankingConfig};
pub use metrics::{MetricsSnapshot, PipelineMetrics, TimedOperation};
pub use runner::{ConceptExtractor, Pipeline, PipelineOutput};
pub use telemetry::init_tracing;
