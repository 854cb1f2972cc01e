use ingest::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("malformed {record}: missing or empty `{field}`")]
    MalformedInput {
        record: &'static str,
        field: &'static str,
    },

    #[error("failed to decode extractor output: {0}")]
    Decode(String),
}

impl ExtractionError {
    fn missing(record: &'static str, field: &'static str) -> Self {
        Self::MalformedInput { record, field }
    }
}

/// One concept mention reported by the extractor for one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExtraction {
    pub name: String,
    pub variant_names: BTreeSet<String>,
    pub evidence: String,
    pub location: Location,
}

impl RawExtraction {
    pub fn new(name: impl Into<String>, evidence: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            variant_names: BTreeSet::new(),
            evidence: evidence.into(),
            location,
        }
    }

    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variant_names.extend(variants.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub location: Location,
    pub evidence: String,
}

/// Canonical concept. `id` keeps the casing it was first seen with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub variant_names: BTreeSet<String>,
    pub appearances: Vec<Appearance>,
}

impl Concept {
    pub fn frequency(&self) -> usize {
        self.appearances.len()
    }

    /// Distinct paragraph locations, ascending.
    pub fn locations(&self) -> BTreeSet<Location> {
        self.appearances.iter().map(|a| a.location).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub source_present: bool,
    pub target_present: bool,
    pub evidence_present: bool,
    /// 1.0 both endpoints in the evidence, 0.5 both only in the document, 0.0 otherwise
    pub proximity_score: f64,
    pub source_match: String,
    pub target_match: String,
}

/// Directed relation between two concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub relation_type: String,
    pub evidence: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

impl Relation {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: impl Into<String>,
        evidence: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            evidence: evidence.into(),
            location,
            validation: None,
        }
    }

    /// Returns a copy carrying `validation`; source, target and evidence are untouched.
    pub fn validated(&self, validation: ValidationResult) -> Self {
        Self {
            validation: Some(validation),
            ..self.clone()
        }
    }

    pub fn has_evidence(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| v.evidence_present)
    }
}

// Loosely-typed shapes as produced by the language model.

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default)]
    pub section: usize,
    pub paragraph: usize,
}

impl From<LocationRecord> for Location {
    fn from(record: LocationRecord) -> Self {
        Location::new(record.section, record.paragraph)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConceptRecord {
    #[serde(alias = "entity", alias = "concept")]
    pub name: Option<String>,
    #[serde(alias = "variants", default)]
    pub variant_names: Vec<String>,
    #[serde(alias = "context")]
    pub evidence: Option<String>,
    #[serde(default)]
    pub location: Option<LocationRecord>,
}

impl ConceptRecord {
    /// Strict conversion. `fallback` is used when the record carries no location.
    pub fn into_extraction(self, fallback: Location) -> Result<RawExtraction, ExtractionError> {
        let name = non_blank(self.name).ok_or_else(|| ExtractionError::missing("concept", "name"))?;
        let evidence = self
            .evidence
            .ok_or_else(|| ExtractionError::missing("concept", "evidence"))?;
        let location = self.location.map(Location::from).unwrap_or(fallback);

        Ok(RawExtraction::new(name, evidence, location).with_variants(
            self.variant_names
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        ))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationRecord {
    #[serde(alias = "source_concept")]
    pub source: Option<String>,
    #[serde(alias = "target_concept")]
    pub target: Option<String>,
    #[serde(alias = "relationship_type", alias = "relation")]
    pub relation_type: Option<String>,
    pub evidence: Option<String>,
    #[serde(default)]
    pub location: Option<LocationRecord>,
}

impl TryFrom<RelationRecord> for Relation {
    type Error = ExtractionError;

    fn try_from(record: RelationRecord) -> Result<Self, Self::Error> {
        let source = non_blank(record.source).ok_or_else(|| ExtractionError::missing("relation", "source"))?;
        let target = non_blank(record.target).ok_or_else(|| ExtractionError::missing("relation", "target"))?;
        let relation_type = non_blank(record.relation_type)
            .ok_or_else(|| ExtractionError::missing("relation", "relation_type"))?;
        let evidence = non_blank(record.evidence).ok_or_else(|| ExtractionError::missing("relation", "evidence"))?;
        let location = record
            .location
            .ok_or_else(|| ExtractionError::missing("relation", "location"))?;

        Ok(Relation::new(source, target, relation_type, evidence, location.into()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_record_aliases() {
        let record: ConceptRecord = serde_json::from_str(
            r#"{"entity": " Tardigrade ", "variants": ["water bear", " "], "context": "Tardigrades survive."}"#,
        )
        .unwrap();
        let raw = record.into_extraction(Location::new(0, 3)).unwrap();

        assert_eq!(raw.name, "Tardigrade");
        assert_eq!(raw.variant_names.len(), 1);
        assert!(raw.variant_names.contains("water bear"));
        assert_eq!(raw.location, Location::new(0, 3));
    }

    #[test]
    fn test_concept_record_missing_fields() {
        let record = ConceptRecord {
            name: Some("   ".to_string()),
            evidence: Some("x".to_string()),
            ..Default::default()
        };
        assert_eq!(
            record.into_extraction(Location::default()),
            Err(ExtractionError::MalformedInput { record: "concept", field: "name" })
        );

        let record = ConceptRecord {
            name: Some("moss".to_string()),
            ..Default::default()
        };
        assert!(record.into_extraction(Location::default()).is_err());
    }

    #[test]
    fn test_relation_record_conversion() {
        let record: RelationRecord = serde_json::from_str(
            r#"{"source_concept": "tardigrade", "target_concept": "cryptobiosis",
                "relationship_type": "enters", "comprehension_value": "ignored",
                "evidence": "Tardigrades enter cryptobiosis.", "location": {"paragraph": 2}}"#,
        )
        .unwrap();
        let relation = Relation::try_from(record).unwrap();

        assert_eq!(relation.source, "tardigrade");
        assert_eq!(relation.relation_type, "enters");
        assert_eq!(relation.location, Location::new(0, 2));
        assert!(relation.validation.is_none());
        assert!(!relation.has_evidence());
    }

    #[test]
    fn test_relation_record_rejects_missing_target() {
        let record = RelationRecord {
            source: Some("a".to_string()),
            relation_type: Some("causes".to_string()),
            evidence: Some("a causes b".to_string()),
            location: Some(LocationRecord::default()),
            ..Default::default()
        };
        assert_eq!(
            Relation::try_from(record),
            Err(ExtractionError::MalformedInput { record: "relation", field: "target" })
        );
    }
}
