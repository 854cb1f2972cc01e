//! Decoding of raw extractor responses into strict records.

use ingest::Location;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;

use crate::schema::{ConceptRecord, ExtractionError, RawExtraction, Relation, RelationRecord};

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").expect("fence pattern"));

const CONCEPT_KEYS: [&str; 3] = ["concepts", "entities", "results"];
const RELATION_KEYS: [&str; 2] = ["relationships", "relations"];

/// Records that decoded, plus one error per record that did not.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub rejected: Vec<ExtractionError>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Strip a markdown code fence (and its language tag) around a JSON payload.
pub fn clean_markdown_json(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let body = FENCE_OPEN.replace(trimmed, "");
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => &body[..],
    };
    body.replace("```", "").trim().to_string()
}

/// Decode concept mentions for one chunk. Records without their own
/// location get `fallback`.
pub fn parse_concepts(response: &str, fallback: Location) -> Result<Parsed<RawExtraction>, ExtractionError> {
    parse_concepts_with(response, |_| fallback)
}

/// Like [`parse_concepts`], but records without their own location are
/// placed by `locate`. A stated location is kept as is.
pub fn parse_concepts_with<F>(response: &str, mut locate: F) -> Result<Parsed<RawExtraction>, ExtractionError>
where
    F: FnMut(&RawExtraction) -> Location,
{
    let items = decode_items(response, &CONCEPT_KEYS)?;
    let mut parsed = Parsed::default();

    for item in items {
        let extraction = from_value::<ConceptRecord>(item, "concept").and_then(|record| {
            let stated = record.location.is_some();
            let mut raw = record.into_extraction(Location::default())?;
            if !stated {
                raw.location = locate(&raw);
            }
            Ok(raw)
        });

        match extraction {
            Ok(raw) => parsed.records.push(raw),
            Err(e) => {
                warn!(error = %e, "Skipping concept record");
                parsed.rejected.push(e);
            }
        }
    }

    Ok(parsed)
}

pub fn parse_relations(response: &str) -> Result<Parsed<Relation>, ExtractionError> {
    let items = decode_items(response, &RELATION_KEYS)?;
    let mut parsed = Parsed::default();

    for item in items {
        match from_value::<RelationRecord>(item, "relation").and_then(Relation::try_from) {
            Ok(relation) => parsed.records.push(relation),
            Err(e) => {
                warn!(error = %e, "Skipping relation record");
                parsed.rejected.push(e);
            }
        }
    }

    Ok(parsed)
}

/// Accept a bare array, an object wrapping the array under one of `keys`,
/// or a single record object.
fn decode_items(response: &str, keys: &[&str]) -> Result<Vec<Value>, ExtractionError> {
    let cleaned = clean_markdown_json(response);
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(&cleaned).map_err(|e| ExtractionError::Decode(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in keys {
                if let Some(inner) = map.remove(*key) {
                    return match inner {
                        Value::Array(items) => Ok(items),
                        other => Err(ExtractionError::Decode(format!("`{key}` is not an array: {other}"))),
                    };
                }
            }
            Ok(vec![Value::Object(map)])
        }
        other => Err(ExtractionError::Decode(format!("unexpected top-level value: {other}"))),
    }
}

fn from_value<T: DeserializeOwned>(value: Value, record: &'static str) -> Result<T, ExtractionError> {
    serde_json::from_value(value).map_err(|e| ExtractionError::Decode(format!("{record}: {e}")))
}
