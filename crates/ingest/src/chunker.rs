use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::chunk::Chunk;
use crate::document::Document;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("chunk_size must be at least 1")]
    EmptyChunk,

    #[error("overlap_size ({overlap}) must be smaller than chunk_size ({chunk})")]
    NonPositiveStep { chunk: usize, overlap: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Paragraphs per chunk
    pub chunk_size: usize,
    /// Paragraphs shared with each neighbour
    pub overlap_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3,
            overlap_size: 1,
        }
    }
}

impl ChunkerConfig {
    /// Paragraphs advanced per chunk.
    pub fn step(&self) -> Result<usize, SegmentError> {
        if self.chunk_size == 0 {
            return Err(SegmentError::EmptyChunk);
        }
        if self.overlap_size >= self.chunk_size {
            return Err(SegmentError::NonPositiveStep {
                chunk: self.chunk_size,
                overlap: self.overlap_size,
            });
        }
        Ok(self.chunk_size - self.overlap_size)
    }
}

pub struct Chunker {
    config: ChunkerConfig,
    step: usize,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, SegmentError> {
        let step = config.step()?;
        Ok(Self { config, step })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (section_index, section) in document.sections.iter().enumerate() {
            let paragraphs: Vec<String> = document
                .section_paragraphs(section_index)
                .into_iter()
                .map(|p| p.text)
                .collect();

            if paragraphs.is_empty() {
                debug!(section = section_index, title = %section.title, "Skipping empty section");
                continue;
            }

            let section_chunks =
                self.chunk_paragraphs(&document.title, section_index, &section.title, &paragraphs);
            debug!(
                section = section_index,
                paragraphs = paragraphs.len(),
                chunks = section_chunks.len(),
                "Segmented section"
            );
            chunks.extend(section_chunks);
        }

        chunks
    }

    /// Windows over one section's paragraphs; overlaps are taken from the
    /// neighbouring chunks of the same section.
    pub fn chunk_paragraphs(
        &self,
        doc_title: &str,
        section_index: usize,
        section: &str,
        paragraphs: &[String],
    ) -> Vec<Chunk> {
        // A window starts at every step below the paragraph count, so a tail
        // window may lie wholly inside the previous one (4..5 after 2..5).
        // The pipeline drops the repeated mentions this produces.
        let mut chunks: Vec<Chunk> = (0..paragraphs.len())
            .step_by(self.step)
            .map(|start| {
                let end = (start + self.config.chunk_size).min(paragraphs.len());
                Chunk::new(
                    doc_title,
                    section_index,
                    section.to_string(),
                    paragraphs[start..end].to_vec(),
                    start,
                )
            })
            .collect();

        let overlap = self.config.overlap_size;
        for i in 0..chunks.len() {
            if i > 0 {
                let prev = &chunks[i - 1].paragraphs;
                let tail = prev[prev.len().saturating_sub(overlap)..].to_vec();
                chunks[i].overlap_prev = tail;
            }
            if i + 1 < chunks.len() {
                let next = &chunks[i + 1].paragraphs;
                let head = next[..overlap.min(next.len())].to_vec();
                chunks[i].overlap_next = head;
            }
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Section;

    fn paras(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Paragraph {i}.")).collect()
    }

    #[test]
    fn test_basic_chunking() {
        let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
        let doc = Document::new("doc", "test", vec![Section::new("Intro", paras(5))]);
        let chunks = chunker.chunk_document(&doc);

        // step = 2: starts at 0, 2, 4
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].paragraph_indices, 0..3);
        assert_eq!(chunks[1].paragraph_indices, 2..5);
        assert_eq!(chunks[2].paragraph_indices, 4..5);
        assert_eq!(chunks[0].section, "Intro");
        assert_eq!(chunks[0].content, "Paragraph 0.\n\nParagraph 1.\n\nParagraph 2.");
    }

    #[test]
    fn test_overlaps_come_from_neighbours() {
        let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
        let chunks = chunker.chunk_paragraphs("doc", 0, "Intro", &paras(5));

        assert!(chunks[0].overlap_prev.is_empty());
        assert_eq!(chunks[0].overlap_next, vec!["Paragraph 2."]);
        assert_eq!(chunks[1].overlap_prev, vec!["Paragraph 2."]);
        assert_eq!(chunks[1].overlap_next, vec!["Paragraph 4."]);
        assert_eq!(chunks[2].overlap_prev, vec!["Paragraph 4."]);
        assert!(chunks[2].overlap_next.is_empty());
    }

    #[test]
    fn test_empty_sections_produce_no_chunks() {
        let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
        let doc = Document::new(
            "doc",
            "test",
            vec![
                Section::new("Blank", vec!["  ".to_string()]),
                Section::new("Body", paras(1)),
            ],
        );
        let chunks = chunker.chunk_document(&doc);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_index, 1);
    }

    #[test]
    fn test_invalid_step_is_rejected() {
        let config = ChunkerConfig { chunk_size: 2, overlap_size: 2 };
        assert_eq!(
            Chunker::new(config).err(),
            Some(SegmentError::NonPositiveStep { chunk: 2, overlap: 2 })
        );
        let config = ChunkerConfig { chunk_size: 0, overlap_size: 0 };
        assert_eq!(Chunker::new(config).err(), Some(SegmentError::EmptyChunk));
    }

    #[test]
    fn test_chunk_ids_are_stable() {
        let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
        let a = chunker.chunk_paragraphs("doc", 0, "Intro", &paras(3));
        let b = chunker.chunk_paragraphs("doc", 0, "Intro", &paras(3));
        assert_eq!(a[0].chunk_id, b[0].chunk_id);
        assert_eq!(a[0].chunk_id.len(), 32);
        assert_ne!(a[0].chunk_id, a[1].chunk_id);
    }
}
