pub mod chunk;
pub mod chunker;
pub mod document;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig, SegmentError};
pub use document::{Document, Location, Paragraph, Section};

/// Segment a document into overlapping paragraph windows.
pub fn segment(document: &Document, chunk_size: usize, overlap_size: usize) -> Result<Vec<Chunk>, SegmentError> {
    let chunker = Chunker::new(ChunkerConfig {
        chunk_size,
        overlap_size,
    })?;
    Ok(chunker.chunk_document(document))
}
