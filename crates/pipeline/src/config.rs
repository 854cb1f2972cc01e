use anyhow::{Context, Result, ensure};
use ingest::ChunkerConfig;
use matching::{MatchConfig, SimilarityMetric};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: OperationMode,
    pub chunking: ChunkerConfig,
    pub matching: MatchConfig,
    pub graph: GraphConfig,
    pub ranking: RankingConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Strict,   // Tight thresholds, fewer fuzzy merges
    Lenient,  // Loose thresholds, more fuzzy merges
    Balanced, // Default thresholds
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub cooccurrence: bool,
    pub relations: bool,
    /// Export filters
    pub min_frequency: usize,
    pub min_edge_weight: usize,
    pub top_central: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    pub num_levels: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cooccurrence: true,
            relations: true,
            min_frequency: 1,
            min_edge_weight: 1,
            top_central: 10,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { num_levels: 5 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10000,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::Balanced,
            chunking: ChunkerConfig::default(),
            matching: MatchConfig::default(),
            graph: GraphConfig::default(),
            ranking: RankingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn strict_mode() -> Self {
        Self {
            mode: OperationMode::Strict,
            matching: MatchConfig {
                concept_threshold: 0.9,
                evidence_threshold: 0.95,
                metric: SimilarityMetric::Gestalt,
            },
            graph: GraphConfig {
                min_frequency: 2,
                min_edge_weight: 2,
                ..GraphConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn lenient_mode() -> Self {
        Self {
            mode: OperationMode::Lenient,
            matching: MatchConfig {
                concept_threshold: 0.7,
                evidence_threshold: 0.75,
                metric: SimilarityMetric::Gestalt,
            },
            ..Self::default()
        }
    }

    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.step().context("Invalid chunking config")?;
        ensure!(self.ranking.num_levels > 0, "ranking.num_levels must be at least 1");

        for (name, value) in [
            ("matching.concept_threshold", self.matching.concept_threshold),
            ("matching.evidence_threshold", self.matching.evidence_threshold),
        ] {
            ensure!((0.0..=1.0).contains(&value), "{name} must be within [0, 1], got {value}");
        }

        Ok(())
    }
}
