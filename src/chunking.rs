//! Document chunking strategies.
//!
//! Two implementations of the [`Chunker`] trait:
//!
//! - [`RecursiveChunker`] — splits by paragraphs, then sentences, then a
//!   hard character cut, and greedily merges the pieces back up to the
//!   chunk size. The ingestion default.
//! - [`FixedSizeChunker`] — sliding character windows with overlap.
//!
//! Sizes and overlaps are measured in characters, not bytes, so multi-byte
//! text never gets cut inside a code point.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Returned chunks carry text and metadata but no embeddings; the pipeline
/// attaches those after the embedding step.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks. Empty documents produce no chunks.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Build a chunk for `document` at position `index` with the given text.
fn make_chunk(document: &Document, index: usize, text: String) -> Chunk {
    let mut metadata = document.metadata.clone();
    metadata.insert("chunk_index".to_string(), index.to_string());
    Chunk {
        id: format!("{}_{index}", document.id),
        text,
        embedding: Vec::new(),
        metadata,
        document_id: document.id.clone(),
    }
}

/// Cut `text` into pieces of at most `max_chars` characters.
fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            pieces.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Take the last `n` characters of `text` for use as overlap seed.
fn tail_chars(text: &str, n: usize) -> String {
    let total = text.chars().count();
    text.chars().skip(total.saturating_sub(n)).collect()
}

/// Splits hierarchically (paragraphs → sentences → hard cut) and merges
/// the resulting segments greedily into chunks of at most `chunk_size`
/// characters. Each chunk after the first is seeded with the last
/// `chunk_overlap` characters of its predecessor so context spanning a
/// boundary appears on both sides.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// `chunk_overlap` values of `chunk_size` or more are clamped so a
    /// chunk always contains more new text than carried-over text.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    /// The largest segment that still fits in a chunk after the overlap
    /// seed and a joining space.
    fn max_segment(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap + 1).max(1)
    }

    /// Split a paragraph into segments no longer than [`max_segment`].
    ///
    /// [`max_segment`]: RecursiveChunker::max_segment
    fn segments_of(&self, paragraph: &str) -> Vec<String> {
        let max = self.max_segment();
        if paragraph.chars().count() <= max {
            return vec![paragraph.to_string()];
        }
        let mut segments = Vec::new();
        for sentence in paragraph.split_inclusive(['.', '!', '?']) {
            let sentence = sentence.trim_start();
            if sentence.is_empty() {
                continue;
            }
            if sentence.chars().count() <= max {
                segments.push(sentence.to_string());
            } else {
                segments.extend(hard_split(sentence, max));
            }
        }
        segments
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        let mut segments = Vec::new();
        for paragraph in document.text.split("\n\n") {
            let paragraph = paragraph.trim();
            if !paragraph.is_empty() {
                segments.extend(self.segments_of(paragraph));
            }
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;
        for segment in segments {
            let segment_len = segment.chars().count();
            // +1 accounts for the joining space.
            if current_len > 0 && current_len + segment_len + 1 > self.chunk_size {
                let overlap = tail_chars(&current, self.chunk_overlap);
                chunks.push(make_chunk(document, chunks.len(), std::mem::take(&mut current)));
                current = overlap;
                current_len = current.chars().count();
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&segment);
            current_len += segment_len;
        }
        if !current.is_empty() {
            chunks.push(make_chunk(document, chunks.len(), current));
        }
        chunks
    }
}

/// Sliding character windows of `chunk_size` with `chunk_overlap` shared
/// between consecutive windows.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`. Overlap is clamped below the size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            let text: String = chars[start..end].iter().collect();
            chunks.push(make_chunk(document, chunks.len(), text));
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}
