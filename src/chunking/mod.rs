//! Document chunking for retrieval ingestion
//!
//! Four strategies behind one facade:
//! - Fixed: byte-budget windows with overlap
//! - Recursive: separator-ladder splitting with boundary adjustment (default)
//! - Semantic: sentence grouping by adjacent-sentence similarity
//! - Structural: fence/table-preserving pass over Markdown-ish text

pub mod fixed;
pub mod recursive;
pub mod semantic;
pub mod structural;

use crate::tokenizer::{HeuristicTokenCounter, TokenCounter};
use crate::types::Chunk;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub use semantic::{JaccardSimilarity, SentenceSimilarity};

/// Sentence-ending characters recognized by the boundary rules
pub(crate) const SENTENCE_TERMINATORS: [char; 6] = ['.', '。', '!', '！', '?', '？'];

/// Chunking strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    Fixed,
    Recursive,
    Semantic,
    Structural,
}

/// Configuration for document chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Strategy used to split documents
    #[serde(default = "default_strategy")]
    pub strategy: ChunkStrategy,

    /// Target upper bound per chunk, in tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks, in tokens (fixed and recursive)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Minimum token count for a chunk to be emitted standalone
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Similarity threshold for semantic splits (semantic only)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Keep table blocks whole (structural only)
    #[serde(default = "default_true")]
    pub preserve_tables: bool,

    /// Keep fenced code blocks whole (structural only)
    #[serde(default = "default_true")]
    pub preserve_code_blocks: bool,

    /// Attach the most recent header to text chunks (structural only)
    #[serde(default = "default_true")]
    pub preserve_headers: bool,
}

fn default_strategy() -> ChunkStrategy {
    ChunkStrategy::Recursive
}

fn default_chunk_size() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    // ~20% of the default chunk size
    102
}

fn default_min_chunk_size() -> usize {
    64
}

fn default_similarity_threshold() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
            similarity_threshold: default_similarity_threshold(),
            preserve_tables: true,
            preserve_code_blocks: true,
            preserve_headers: true,
        }
    }
}

/// Document chunker splitting text into retrieval-sized pieces
///
/// Stateless beyond its configuration; instances are freely shared. The
/// chunker never fails: malformed input yields at worst a single
/// whole-document chunk.
pub struct DocumentChunker {
    config: ChunkingConfig,
    counter: Arc<dyn TokenCounter>,
    similarity: Arc<dyn SentenceSimilarity>,
}

impl DocumentChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            config,
            counter: Arc::new(HeuristicTokenCounter::new()),
            similarity: Arc::new(JaccardSimilarity),
        }
    }

    /// Replace the token counter (e.g. with a real BPE counter)
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Replace the sentence similarity used by the semantic strategy
    pub fn with_similarity(mut self, similarity: Arc<dyn SentenceSimilarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub(crate) fn counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    pub(crate) fn similarity_fn(&self) -> &dyn SentenceSimilarity {
        self.similarity.as_ref()
    }

    /// Split a document into chunks using the configured strategy
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chunks = match self.config.strategy {
            ChunkStrategy::Fixed => fixed::chunk(self, text),
            ChunkStrategy::Recursive => recursive::chunk(self, text),
            ChunkStrategy::Semantic => semantic::chunk(self, text),
            ChunkStrategy::Structural => structural::chunk(self, text),
        };

        debug!(
            strategy = ?self.config.strategy,
            chunks = chunks.len(),
            "chunked document"
        );
        chunks
    }
}

impl Default for DocumentChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

/// Largest byte index `<= idx` that lies on a char boundary
pub(crate) fn floor_char_boundary(text: &str, idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    let mut i = idx;
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest byte index `>= idx` that lies on a char boundary
pub(crate) fn ceil_char_boundary(text: &str, idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    let mut i = idx;
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Byte offsets of the whitespace-trimmed region of `text[start..end]`
pub(crate) fn trimmed_region(text: &str, start: usize, end: usize) -> (usize, usize) {
    let slice = &text[start..end];
    let trimmed = slice.trim_start();
    let lead = slice.len() - trimmed.len();
    let trimmed = trimmed.trim_end();
    (start + lead, start + lead + trimmed.len())
}

/// Build a trimmed chunk for the source region `[start, end)`
///
/// Returns None when the region trims down to nothing.
pub(crate) fn make_chunk(
    counter: &dyn TokenCounter,
    text: &str,
    start: usize,
    end: usize,
) -> Option<Chunk> {
    let (s, e) = trimmed_region(text, start, end);
    if s >= e {
        return None;
    }
    let content = text[s..e].to_string();
    let token_count = counter.count_tokens(&content);
    Some(Chunk::new(content, s, e, token_count))
}
