use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::Range;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub content: String,
    pub paragraphs: Vec<String>,
    pub paragraph_indices: Range<usize>, // [start, end) within the section
    pub section_index: usize,
    pub section: String,
    pub overlap_prev: Vec<String>,
    pub overlap_next: Vec<String>,
}

impl Chunk {
    pub fn new(
        doc_title: &str,
        section_index: usize,
        section: String,
        paragraphs: Vec<String>,
        start: usize,
    ) -> Self {
        let content = paragraphs.join("\n\n");
        let paragraph_indices = start..start + paragraphs.len();
        let chunk_id = Self::generate_chunk_id(doc_title, section_index, &paragraph_indices, &content);

        Self {
            chunk_id,
            content,
            paragraphs,
            paragraph_indices,
            section_index,
            section,
            overlap_prev: Vec::new(),
            overlap_next: Vec::new(),
        }
    }

    fn generate_chunk_id(
        doc_title: &str,
        section_index: usize,
        indices: &Range<usize>,
        content: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(doc_title.as_bytes());
        hasher.update(section_index.to_string().as_bytes());
        hasher.update(indices.start.to_string().as_bytes());
        hasher.update(indices.end.to_string().as_bytes());
        hasher.update(content.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }

    /// Estimate token count (rough: 1.3 tokens per word)
    pub fn estimated_tokens(&self) -> usize {
        let word_count = self.content.split_whitespace().count();
        (word_count as f64 * 1.3) as usize
    }

    /// Pairs each paragraph with its index in the section.
    pub fn indexed_paragraphs(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.paragraph_indices
            .clone()
            .zip(self.paragraphs.iter().map(String::as_str))
    }
}
