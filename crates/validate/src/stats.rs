use extract::Relation;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProximityCounts {
    pub score_1: usize,
    #[serde(rename = "score_0.5")]
    pub score_half: usize,
    pub score_0: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PresenceCounts {
    #[serde(rename = "true")]
    pub present: usize,
    #[serde(rename = "false")]
    pub absent: usize,
}

impl PresenceCounts {
    fn record(&mut self, present: bool) {
        if present {
            self.present += 1;
        } else {
            self.absent += 1;
        }
    }

    fn add(&mut self, other: &PresenceCounts) {
        self.present += other.present;
        self.absent += other.absent;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Coverage {
    pub percentage: f64,
    pub found: usize,
    pub total: usize,
}

impl Coverage {
    fn recompute(&mut self) {
        self.percentage = if self.total > 0 {
            (self.found as f64 / self.total as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationStats {
    pub total_relations: usize,
    pub proximity_scores: ProximityCounts,
    pub evidence_present: PresenceCounts,
    pub source_present: PresenceCounts,
    pub target_present: PresenceCounts,
    pub coverage: Coverage,
}

impl ValidationStats {
    /// Relations without a validation record are counted as unsupported.
    pub fn from_relations(relations: &[Relation]) -> Self {
        let mut stats = Self {
            total_relations: relations.len(),
            ..Default::default()
        };

        for relation in relations {
            let (score, evidence, source, target) = match &relation.validation {
                Some(v) => (v.proximity_score, v.evidence_present, v.source_present, v.target_present),
                None => (0.0, false, false, false),
            };

            if score >= 1.0 {
                stats.proximity_scores.score_1 += 1;
            } else if score >= 0.5 {
                stats.proximity_scores.score_half += 1;
            } else {
                stats.proximity_scores.score_0 += 1;
            }

            stats.evidence_present.record(evidence);
            stats.source_present.record(source);
            stats.target_present.record(target);
        }

        stats.coverage.found = stats.evidence_present.present;
        stats.coverage.total = relations.len();
        stats.coverage.recompute();
        stats
    }

    fn absorb(&mut self, other: &ValidationStats) {
        self.total_relations += other.total_relations;
        self.proximity_scores.score_1 += other.proximity_scores.score_1;
        self.proximity_scores.score_half += other.proximity_scores.score_half;
        self.proximity_scores.score_0 += other.proximity_scores.score_0;
        self.evidence_present.add(&other.evidence_present);
        self.source_present.add(&other.source_present);
        self.target_present.add(&other.target_present);
        self.coverage.found += other.coverage.found;
        self.coverage.total += other.coverage.total;
        self.coverage.recompute();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleValidation {
    pub article: String,
    pub category: String,
    pub relations: Vec<Relation>,
    pub statistics: ValidationStats,
}

impl ArticleValidation {
    pub fn new(article: impl Into<String>, category: impl Into<String>, relations: Vec<Relation>) -> Self {
        let statistics = ValidationStats::from_relations(&relations);
        Self {
            article: article.into(),
            category: category.into(),
            relations,
            statistics,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStats {
    pub articles: Vec<String>,
    #[serde(flatten)]
    pub totals: ValidationStats,
}

/// Sum per-article statistics by category.
pub fn aggregate_by_category(articles: &[ArticleValidation]) -> BTreeMap<String, CategoryStats> {
    let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();

    for article in articles {
        let entry = categories.entry(article.category.clone()).or_default();
        entry.articles.push(article.article.clone());
        entry.totals.absorb(&article.statistics);
    }

    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::ValidationResult;
    use ingest::Location;

    fn validated(score: f64, evidence: bool) -> Relation {
        Relation::new("a", "b", "causes", "a causes b", Location::default()).validated(ValidationResult {
            source_present: score > 0.0,
            target_present: score > 0.0,
            evidence_present: evidence,
            proximity_score: score,
            source_match: String::new(),
            target_match: String::new(),
        })
    }

    #[test]
    fn test_statistics() {
        let relations = vec![
            validated(1.0, true),
            validated(0.5, true),
            validated(0.0, false),
            Relation::new("x", "y", "z", "w", Location::default()),
        ];
        let stats = ValidationStats::from_relations(&relations);

        assert_eq!(stats.total_relations, 4);
        assert_eq!(stats.proximity_scores, ProximityCounts { score_1: 1, score_half: 1, score_0: 2 });
        assert_eq!(stats.evidence_present, PresenceCounts { present: 2, absent: 2 });
        assert_eq!(stats.coverage.percentage, 50.0);
    }

    #[test]
    fn test_coverage_rounds_to_two_places() {
        let relations = vec![validated(1.0, true), validated(1.0, false), validated(1.0, false)];
        assert_eq!(ValidationStats::from_relations(&relations).coverage.percentage, 33.33);
        assert_eq!(ValidationStats::from_relations(&[]).coverage.percentage, 0.0);
    }

    #[test]
    fn test_aggregate_by_category() {
        let articles = vec![
            ArticleValidation::new("Tardigrade", "biology", vec![validated(1.0, true)]),
            ArticleValidation::new("Moss", "biology", vec![validated(0.0, false)]),
            ArticleValidation::new("Volcano", "geology", vec![validated(0.5, true)]),
        ];
        let categories = aggregate_by_category(&articles);

        let biology = &categories["biology"];
        assert_eq!(biology.articles, vec!["Tardigrade", "Moss"]);
        assert_eq!(biology.totals.total_relations, 2);
        assert_eq!(biology.totals.coverage.percentage, 50.0);
        assert_eq!(categories["geology"].totals.proximity_scores.score_half, 1);
    }
}
