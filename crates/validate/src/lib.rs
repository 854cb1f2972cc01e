//! Textual support checks for extracted relations.

pub mod stats;
pub mod text;
pub mod validator;

pub use stats::{ArticleValidation, CategoryStats, ValidationStats, aggregate_by_category};
pub use text::{clean_text, split_sentences};
pub use validator::{PreparedText, RelationValidator};

use extract::{Relation, ValidationResult};

/// Validate one relation with the default thresholds.
pub fn validate(relation: &Relation, document_text: &str) -> ValidationResult {
    RelationValidator::default().validate(relation, document_text)
}
